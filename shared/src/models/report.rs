//! Report Model
//!
//! 报表输出结构。统计周期为截止到当前时刻的滚动窗口。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::order::UnknownVariant;

/// Rolling reporting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl ReportPeriod {
    pub const ALL: &'static [&'static str] = &["day", "week", "month", "year"];

    /// Window length in milliseconds
    pub fn duration_millis(&self) -> i64 {
        const DAY: i64 = 24 * 60 * 60 * 1000;
        match self {
            Self::Day => DAY,
            Self::Week => 7 * DAY,
            Self::Month => 30 * DAY,
            Self::Year => 365 * DAY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(UnknownVariant {
                kind: "report period",
                value: s.to_string(),
                valid: Self::ALL,
            }),
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revenue of the current window against the previous one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueComparison {
    pub period: ReportPeriod,
    pub current: i64,
    pub previous: i64,
    /// None when the previous window had no revenue
    pub change_percent: Option<f64>,
}

/// Order count of the current window against the previous one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderComparison {
    pub period: ReportPeriod,
    pub current: u64,
    pub previous: u64,
    pub change_percent: Option<f64>,
    /// 当前窗口内按状态的订单数
    pub by_status: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOrderedProduct {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRatedProduct {
    pub product_id: String,
    pub name: String,
    pub average_rating: f64,
    pub rating_count: i64,
}

/// Query string shared by the report endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    pub period: Option<String>,
    pub limit: Option<usize>,
}
