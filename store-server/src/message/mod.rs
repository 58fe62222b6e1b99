//! 消息总线模块
//!
//! 订单写入提交后向进程内订阅者广播事件；WebSocket 连接是唯一的订阅方。

pub mod bus;

pub use bus::MessageBus;
pub use shared::message::{BusMessage, EventType, OrderSnapshot};
