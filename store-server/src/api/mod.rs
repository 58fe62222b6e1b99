//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`products`] - 商品查询、创建和评分
//! - [`orders`] - 订单生命周期和管理端 setter
//! - [`reports`] - 报表
//! - [`payments`] - 支付渠道回调 (MoMo IPN / PayOS webhook)
//! - [`events`] - WebSocket 订单事件推送

pub mod events;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reports;

// Re-export common types for handlers
pub use crate::utils::{ApiResponse, AppResult};
