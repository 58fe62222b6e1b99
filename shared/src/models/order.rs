//! Order Model
//!
//! 订单主体、三组独立的状态枚举（订单状态 / 支付状态 / 退款状态）以及请求载荷。
//! 状态之间没有强制的转换表，管理端的 setter 只校验枚举值本身。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, ErrorCode};
use std::str::FromStr;

/// 字符串无法解析为枚举值
///
/// Display 输出包含全部合法取值，直接作为 400 响应的 message。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub valid: &'static [&'static str],
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid {} '{}'. Valid values: {}",
            self.kind,
            self.value,
            self.valid.join(", ")
        )
    }
}

impl std::error::Error for UnknownVariant {}

/// 为状态枚举生成 `ALL` / `as_str` / `FromStr` / `Display`
macro_rules! string_enum {
    ($name:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        impl $name {
            /// All accepted string values, in declaration order
            pub const ALL: &'static [&'static str] = &[$(stringify!($variant)),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                        valid: Self::ALL,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// 订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Draft,
    Pending,
    Confirmed,
    Delivering,
    Delivered,
    Cancelled,
    CancelledByAdmin,
}

string_enum!(
    OrderStatus,
    "order status",
    [Draft, Pending, Confirmed, Delivering, Delivered, Cancelled, CancelledByAdmin]
);

impl OrderStatus {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::CancelledByAdmin)
    }

    /// 顾客只能在订单确认之前取消
    pub fn can_customer_cancel(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending)
    }
}

/// 支付状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PayingStatus {
    #[default]
    Unpaid,
    Paid,
    Failed,
}

string_enum!(PayingStatus, "paying status", [Unpaid, Paid, Failed]);

/// 退款状态
///
/// 约定的推进顺序: NotInitiated → Pending → Processing → Completed | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RefundStatus {
    #[default]
    NotInitiated,
    Pending,
    Processing,
    Completed,
    Failed,
}

string_enum!(
    RefundStatus,
    "refund status",
    [NotInitiated, Pending, Processing, Completed, Failed]
);

impl RefundStatus {
    /// Position in the conventional progression; Completed and Failed share the last step.
    pub fn rank(&self) -> u8 {
        match self {
            Self::NotInitiated => 0,
            Self::Pending => 1,
            Self::Processing => 2,
            Self::Completed | Self::Failed => 3,
        }
    }
}

/// 支付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// 货到付款
    CashOnDelivery,
    /// MoMo 电子钱包
    Momo,
    /// PayOS 银行卡 / 转账
    PayOs,
}

string_enum!(PaymentMethod, "payment method", [CashOnDelivery, Momo, PayOs]);

impl PaymentMethod {
    pub fn is_cash(&self) -> bool {
        matches!(self, Self::CashOnDelivery)
    }
}

/// 订单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i64,
    /// 下单时的商品名称快照
    pub name: String,
    /// 下单时的单价快照 (VND)
    pub unit_price: i64,
    pub line_total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient_name: String,
    pub phone: String,
    pub address: String,
}

/// 退款收款账户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundBank {
    pub bank_name: String,
    pub account_number: String,
    pub holder_name: String,
}

/// 审计记录（只追加）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
    pub action: String,
    pub at: i64,
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// 内部 ID，同时是存储记录的 key
    pub order_id: String,
    /// 客户端提供的订单号（唯一）
    pub order_number: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub paying_status: PayingStatus,
    #[serde(default)]
    pub refund_status: RefundStatus,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    pub subtotal: i64,
    #[serde(default)]
    pub shipping_fee: i64,
    pub total_price: i64,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    #[serde(default)]
    pub requires_refund: bool,
    #[serde(default)]
    pub refund_bank: Option<RefundBank>,
    /// 发给支付渠道的引用号，用于把 IPN 回调映射回订单
    #[serde(default)]
    pub payment_ref: Option<String>,
    #[serde(default)]
    pub history: Vec<OrderHistoryEntry>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub purchased_at: Option<i64>,
    #[serde(default)]
    pub paid_at: Option<i64>,
    #[serde(default)]
    pub cancelled_at: Option<i64>,
    #[serde(default)]
    pub delivered_at: Option<i64>,
}

impl Order {
    /// New draft order, totals computed from `items`
    pub fn draft(
        order_id: String,
        order_number: String,
        user_id: String,
        items: Vec<OrderItem>,
        now: i64,
    ) -> Result<Self, AppError> {
        let mut order = Self {
            order_id,
            order_number,
            user_id,
            items,
            status: OrderStatus::Draft,
            paying_status: PayingStatus::Unpaid,
            refund_status: RefundStatus::NotInitiated,
            payment_method: None,
            subtotal: 0,
            shipping_fee: 0,
            total_price: 0,
            shipping_address: None,
            note: None,
            cancel_reason: None,
            requires_refund: false,
            refund_bank: None,
            payment_ref: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
            purchased_at: None,
            paid_at: None,
            cancelled_at: None,
            delivered_at: None,
        };
        order.recalculate_totals()?;
        order.record("Order created", now);
        Ok(order)
    }

    /// 重新计算 subtotal / total_price，溢出 i64 时返回 ValueOutOfRange
    pub fn recalculate_totals(&mut self) -> Result<(), AppError> {
        let overflow = || {
            AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "Order total exceeds the supported amount",
            )
            .with_detail("order_number", self.order_number.clone())
        };
        let subtotal = self
            .items
            .iter()
            .try_fold(0i64, |acc, i| acc.checked_add(i.line_total))
            .ok_or_else(overflow)?;
        let total = subtotal
            .checked_add(self.shipping_fee)
            .ok_or_else(overflow)?;
        self.subtotal = subtotal;
        self.total_price = total;
        Ok(())
    }

    /// 追加审计记录并刷新 updated_at
    pub fn record(&mut self, action: impl Into<String>, now: i64) {
        self.history.push(OrderHistoryEntry {
            action: action.into(),
            at: now,
        });
        self.updated_at = now;
    }

    pub fn is_paid(&self) -> bool {
        self.paying_status == PayingStatus::Paid
    }

    pub fn is_cash(&self) -> bool {
        self.payment_method.is_some_and(|m| m.is_cash())
    }

    /// 非现金订单取消后需要退款
    ///
    /// 未支付的订单也要标记：渠道链接在取消后仍可能完成扣款。
    pub fn needs_refund_on_cancel(&self) -> bool {
        self.payment_method.is_some_and(|m| !m.is_cash())
    }

    /// 进入取消状态并处理退款标记
    ///
    /// 提供了银行信息且需要退款时，退款状态直接进入 Pending。
    pub fn mark_cancelled(
        &mut self,
        status: OrderStatus,
        reason: Option<String>,
        refund_bank: Option<RefundBank>,
        now: i64,
    ) {
        debug_assert!(status.is_cancelled());
        self.status = status;
        self.cancelled_at = Some(now);
        if reason.is_some() {
            self.cancel_reason = reason;
        }

        if self.needs_refund_on_cancel() {
            self.requires_refund = true;
            if let Some(bank) = refund_bank
                && self.refund_status == RefundStatus::NotInitiated
            {
                self.refund_bank = Some(bank);
                self.refund_status = RefundStatus::Pending;
            }
        }

        let action = match (status, &self.cancel_reason) {
            (OrderStatus::CancelledByAdmin, _) => "Order cancelled by admin".to_string(),
            (_, Some(r)) => format!("Order cancelled: {}", r),
            (_, None) => "Order cancelled".to_string(),
        };
        self.record(action, now);
    }

    pub fn mark_paid(&mut self, now: i64) {
        self.paying_status = PayingStatus::Paid;
        self.paid_at = Some(now);
    }
}

// ============================================================================
// Request payloads
// ============================================================================

/// Line item in a create request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: i64,
}

/// Create (or update in place) a draft order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub order_number: String,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Checkout a draft order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub shipping_fee: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub refund_bank: Option<RefundBank>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub refund_bank: RefundBank,
}

/// 管理端状态 setter 的请求体，值在服务层解析
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Query string of the order listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Checkout redirect returned by the payment provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub order_number: String,
    pub payment_method: PaymentMethod,
    pub payment_ref: String,
    pub checkout_url: String,
}

/// One page of an order listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Matching orders before pagination
    pub total: usize,
    pub limit: u32,
    pub offset: u32,
}
