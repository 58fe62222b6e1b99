//! 消息总线核心实现
//!
//! # 消息流
//!
//! ```text
//! OrderService ──▶ publish() ──▶ broadcast::Sender ──┬──▶ WebSocket 连接 A
//!                                                    └──▶ WebSocket 连接 B
//! ```
//!
//! 没有订阅者时消息直接丢弃；慢订阅者会收到 `Lagged` 并跳过积压的消息。

use shared::message::BusMessage;
use tokio::sync::broadcast;

use crate::utils::AppError;

/// Default capacity of the broadcast channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// 消息总线 - 负责订单事件的广播
#[derive(Debug, Clone)]
pub struct MessageBus {
    /// 服务器到客户端的广播通道
    server_tx: broadcast::Sender<BusMessage>,
}

impl MessageBus {
    /// 创建默认容量的消息总线
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// 创建指定容量的消息总线
    pub fn with_capacity(capacity: usize) -> Self {
        let (server_tx, _) = broadcast::channel(capacity.max(1));
        Self { server_tx }
    }

    /// 发布消息 (服务器 -> 所有订阅者)
    ///
    /// 返回收到消息的订阅者数量；没有订阅者时返回错误
    pub fn publish(&self, msg: BusMessage) -> Result<usize, AppError> {
        self.server_tx
            .send(msg)
            .map_err(|_| AppError::internal("No active subscribers"))
    }

    /// 订阅服务器广播
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.server_tx.subscribe()
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.server_tx.receiver_count()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::EventType;
    use shared::models::Order;
    use tokio::sync::broadcast::error::RecvError;

    fn event(n: &str) -> BusMessage {
        let order = Order::draft("id".into(), n.into(), "u1".into(), vec![], 1).unwrap();
        BusMessage::order_event(EventType::OrderCreated, &order)
    }

    #[test]
    fn test_publish_without_subscribers_fails() {
        let bus = MessageBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.publish(event("A")).is_err());
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = MessageBus::with_capacity(8);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(event("A")).unwrap(), 2);

        assert_eq!(rx1.recv().await.unwrap().order_number, "A");
        assert_eq!(rx2.recv().await.unwrap().order_number, "A");
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let bus = MessageBus::with_capacity(2);
        let mut rx = bus.subscribe();

        for n in ["A", "B", "C", "D"] {
            bus.publish(event(n)).unwrap();
        }

        match rx.recv().await {
            Err(RecvError::Lagged(skipped)) => assert_eq!(skipped, 2),
            other => panic!("expected lag, got {other:?}"),
        }
        assert_eq!(rx.recv().await.unwrap().order_number, "C");
    }
}
