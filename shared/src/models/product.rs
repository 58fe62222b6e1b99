//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    /// Price in VND
    pub price: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Sum of all ratings received
    #[serde(default)]
    pub rating_total: i64,
    #[serde(default)]
    pub rating_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// 平均评分，无评分时为 0
    pub fn average_rating(&self) -> f64 {
        if self.rating_count == 0 {
            0.0
        } else {
            self.rating_total as f64 / self.rating_count as f64
        }
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub price: i64,
    pub is_active: Option<bool>,
}

/// Rating payload, 1..=5
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingCreate {
    pub rating: i64,
}
