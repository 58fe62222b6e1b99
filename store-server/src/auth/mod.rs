//! 调用方身份
//!
//! 认证由上游网关完成，本服务信任网关转发的请求头：
//! - `x-user-id` - 用户 ID (必需)
//! - `x-user-role` - `admin` | `customer` (缺省为 customer)
//!
//! - [`CurrentUser`] - 当前用户上下文，handler 中作为 extractor 使用
//! - [`AdminUser`] - 仅允许管理员的 extractor

pub mod extractor;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use extractor::AdminUser;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Customer,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            _ => Err(()),
        }
    }
}

/// 当前用户上下文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// 用户 ID
    pub user_id: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn customer(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 本人或管理员可读
    pub fn can_read(&self, owner_id: &str) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}
