//! 消息总线消息类型定义
//!
//! 订单写入提交后发布到进程内广播总线，再由 WebSocket 推送给客户端。
//! 投递是尽力而为的，没有确认和重放。

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{Order, OrderStatus, PayingStatus, PaymentMethod, RefundStatus};

/// 订单事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    OrderCreated,
    OrderUpdated,
    OrderPurchased,
    OrderCancelled,
    OrderStatusChanged,
    PaymentStatusChanged,
    RefundStatusChanged,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventType::OrderCreated => "order_created",
            EventType::OrderUpdated => "order_updated",
            EventType::OrderPurchased => "order_purchased",
            EventType::OrderCancelled => "order_cancelled",
            EventType::OrderStatusChanged => "order_status_changed",
            EventType::PaymentStatusChanged => "payment_status_changed",
            EventType::RefundStatusChanged => "refund_status_changed",
        };
        f.write_str(s)
    }
}

/// 事件发生时订单状态的快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub status: OrderStatus,
    pub paying_status: PayingStatus,
    pub refund_status: RefundStatus,
    pub payment_method: Option<PaymentMethod>,
    pub total_price: i64,
    pub requires_refund: bool,
}

impl From<&Order> for OrderSnapshot {
    fn from(order: &Order) -> Self {
        Self {
            status: order.status,
            paying_status: order.paying_status,
            refund_status: order.refund_status,
            payment_method: order.payment_method,
            total_price: order.total_price,
            requires_refund: order.requires_refund,
        }
    }
}

/// 消息总线消息体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    /// 订单所属用户，推送时按它过滤
    pub user_id: String,
    pub order_number: String,
    pub snapshot: OrderSnapshot,
    pub timestamp: i64,
}

impl BusMessage {
    /// 创建订单事件
    pub fn order_event(event_type: EventType, order: &Order) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            user_id: order.user_id.clone(),
            order_number: order.order_number.clone(),
            snapshot: OrderSnapshot::from(order),
            timestamp: crate::util::now_millis(),
        }
    }

    /// 该消息是否应推送给指定用户
    pub fn is_visible_to(&self, user_id: &str, is_admin: bool) -> bool {
        is_admin || self.user_id == user_id
    }
}
