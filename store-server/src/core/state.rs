use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::{Config, ServerError};
use crate::db::DbService;
use crate::message::MessageBus;
use crate::orders::OrderService;
use crate::payments::PaymentGateways;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 每个请求克隆一份，成员都是廉价的句柄拷贝。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | message_bus | MessageBus | 订单事件广播 |
/// | payments | PaymentGateways | MoMo / PayOS 渠道 |
///
/// ```ignore
/// let orders = state.orders();
/// let (order, updated) = orders.create_order(&user, req).await?;
/// ```
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 消息总线
    pub message_bus: MessageBus,
    /// 支付渠道
    pub payments: PaymentGateways,
}

impl ServerState {
    /// 手动构造，测试中用来注入假的支付渠道
    pub fn with_parts(
        config: Config,
        db: Surreal<Db>,
        message_bus: MessageBus,
        payments: PaymentGateways,
    ) -> Self {
        Self {
            config,
            db,
            message_bus,
            payments,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/store.db)
    /// 3. 消息总线与支付渠道
    pub async fn initialize(config: &Config) -> Result<Self, ServerError> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_dir().join("store.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .map_err(ServerError::Database)?;

        let message_bus = MessageBus::with_capacity(config.event_channel_capacity);
        let payments = PaymentGateways::from_config(config)
            .map_err(|e| ServerError::Config(format!("Failed to build payment client: {e}")))?;

        Ok(Self::with_parts(
            config.clone(),
            db_service.db,
            message_bus,
            payments,
        ))
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取消息总线
    pub fn message_bus(&self) -> &MessageBus {
        &self.message_bus
    }

    /// 订单服务
    pub fn orders(&self) -> OrderService {
        OrderService::new(
            self.db.clone(),
            self.message_bus.clone(),
            self.payments.clone(),
        )
    }
}
