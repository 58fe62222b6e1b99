//! Store Server - 电商店铺订单后端
//!
//! # 架构概述
//!
//! 路由处理器校验输入后委托给订单服务，服务读写嵌入式文档库并返回 JSON。
//! 写入提交后通过进程内消息总线推送事件。
//!
//! - **订单** (`orders`): 订单生命周期、支付确认、退款、报表
//! - **支付** (`payments`): MoMo / PayOS 渠道
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **消息总线** (`message`): 订单事件广播
//! - **HTTP API** (`api`): RESTful API + WebSocket
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── auth/          # 调用方身份 extractor
//! ├── services/      # HTTP 服务 (路由 + 中间件)
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 订单服务和报表
//! ├── payments/      # 支付渠道
//! ├── utils/         # 日志、输入校验
//! ├── db/            # 数据库层
//! └── message/       # 消息总线
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod message;
pub mod orders;
pub mod payments;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{AdminUser, CurrentUser, Role};
pub use core::{Config, Server, ServerState};
pub use message::MessageBus;
pub use orders::OrderService;
pub use payments::{PaymentGateway, PaymentGateways};
pub use services::HttpsService;
pub use shared::message::{BusMessage, EventType};

// Re-export unified error types from shared
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 准备工作目录并初始化日志
pub fn setup_environment(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    config.ensure_work_dir_structure()?;
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );
    Ok(())
}
