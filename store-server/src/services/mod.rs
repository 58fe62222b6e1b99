//! 服务层
//!
//! - [`HttpsService`] - 组装路由和中间件，启动 HTTP 服务

pub mod https;

pub use https::{HttpsService, OneshotResult, build_app};
