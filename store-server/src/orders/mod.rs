//! 订单模块
//!
//! - [`OrderService`] - 订单生命周期、支付确认、退款和管理端操作
//! - [`reports`] - 报表聚合纯函数

pub mod reports;
pub mod service;

pub use service::{OrderService, report_limit};

#[cfg(test)]
mod tests;
