//! Order Service
//!
//! 订单生命周期的全部写操作。每个操作都是「读文档 → 校验 → 修改 → 整体写回 → 发布事件」，
//! 没有事务和版本号，并发写入以最后一次为准。
//!
//! 状态只在以下位置有约束：
//! - create (更新已有订单) / purchase 要求 Draft
//! - 顾客取消要求 Draft 或 Pending
//! - 退款申请要求已取消且带退款标记
//!
//! 管理端 setter 只校验枚举值本身。

use std::collections::HashMap;
use std::str::FromStr;

use shared::message::{BusMessage, EventType};
use shared::models::{
    CancelOrderRequest, CreateOrderRequest, Order, OrderComparison, OrderItem, OrderItemInput,
    OrderListQuery, OrderPage, OrderStatus, PayingStatus, PaymentLink, PaymentMethod,
    PurchaseOrderRequest, RefundRequest, RefundStatus, ReportPeriod, RevenueComparison,
    TopOrderedProduct, TopRatedProduct, UnknownVariant,
};
use shared::util::{now_millis, snowflake_id};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::reports::{self, Windows};
use crate::auth::CurrentUser;
use crate::db::repository::{OrderFilter, OrderRepository, ProductRepository, RepoError};
use crate::message::MessageBus;
use crate::payments::{PaymentGateways, PaymentLinkRequest};
use crate::utils::validation::{
    MAX_LINE_QUANTITY, MAX_NOTE_LEN, MAX_ORDER_NUMBER_LEN, MAX_SHIPPING_FEE, MAX_SHORT_TEXT_LEN,
    validate_amount, validate_optional_text, validate_refund_bank, validate_required_text,
    validate_shipping_address,
};
use crate::utils::{AppError, AppResult, ErrorCode};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_REPORT_LIMIT: usize = 10;
pub const MAX_REPORT_LIMIT: usize = 100;

fn quantity_out_of_range(product_id: &str) -> AppError {
    AppError::with_message(
        ErrorCode::ValueOutOfRange,
        format!("quantity must be between 1 and {MAX_LINE_QUANTITY}"),
    )
    .with_detail("field", "quantity")
    .with_detail("product_id", product_id)
}

/// 把枚举解析错误转换为带合法取值列表的 400
fn parse_enum<T>(raw: &str, code: ErrorCode) -> AppResult<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    raw.parse::<T>().map_err(|e| {
        AppError::with_message(code, e.to_string()).with_detail("valid_values", e.valid.to_vec())
    })
}

#[derive(Clone)]
pub struct OrderService {
    orders: OrderRepository,
    products: ProductRepository,
    bus: MessageBus,
    payments: PaymentGateways,
}

impl OrderService {
    pub fn new(db: Surreal<Db>, bus: MessageBus, payments: PaymentGateways) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            products: ProductRepository::new(db),
            bus,
            payments,
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// 写入已提交后发布事件，失败只记录日志
    fn notify(&self, event_type: EventType, order: &Order) {
        let msg = BusMessage::order_event(event_type, order);
        match self.bus.publish(msg) {
            Ok(receivers) => tracing::debug!(
                event = %event_type,
                order_number = %order.order_number,
                receivers,
                "Order event published"
            ),
            Err(_) => tracing::debug!(
                event = %event_type,
                order_number = %order.order_number,
                "No subscribers, order event dropped"
            ),
        }
    }

    async fn load(&self, order_number: &str) -> AppResult<Order> {
        self.orders
            .find_by_number(order_number)
            .await?
            .ok_or_else(|| AppError::order_not_found(order_number))
    }

    /// 顾客操作只允许订单所有者本人
    async fn load_owned(&self, user: &CurrentUser, order_number: &str) -> AppResult<Order> {
        let order = self.load(order_number).await?;
        if order.user_id != user.user_id {
            tracing::warn!(
                user_id = %user.user_id,
                order_number = %order_number,
                "Order action by non-owner denied"
            );
            return Err(AppError::permission_denied(format!(
                "Order {} belongs to another user",
                order_number
            )));
        }
        Ok(order)
    }

    /// 合并重复商品行并按当前商品价格生成订单行
    async fn build_items(&self, inputs: &[OrderItemInput]) -> AppResult<Vec<OrderItem>> {
        if inputs.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty));
        }

        let mut merged: Vec<(String, i64)> = Vec::with_capacity(inputs.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        for input in inputs {
            validate_required_text(&input.product_id, "product_id", MAX_SHORT_TEXT_LEN)?;
            if input.quantity < 1 || input.quantity > MAX_LINE_QUANTITY {
                return Err(AppError::validation(format!(
                    "quantity must be between 1 and {MAX_LINE_QUANTITY}"
                ))
                .with_detail("field", "quantity")
                .with_detail("product_id", input.product_id.clone()));
            }
            let id = input.product_id.trim().to_string();
            match index.get(&id) {
                Some(&i) => {
                    let total = merged[i].1 + input.quantity;
                    if total > MAX_LINE_QUANTITY {
                        return Err(quantity_out_of_range(&id));
                    }
                    merged[i].1 = total;
                }
                None => {
                    index.insert(id.clone(), merged.len());
                    merged.push((id, input.quantity));
                }
            }
        }

        let ids: Vec<String> = merged.iter().map(|(id, _)| id.clone()).collect();
        let products: HashMap<String, _> = self
            .products
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|p| (p.product_id.clone(), p))
            .collect();

        merged
            .into_iter()
            .map(|(product_id, quantity)| {
                let product = products
                    .get(&product_id)
                    .ok_or_else(|| AppError::product_not_found(product_id.clone()))?;
                if !product.is_active {
                    return Err(AppError::with_message(
                        ErrorCode::ProductInactive,
                        format!("Product {} is no longer available", product.name),
                    )
                    .with_detail("product_id", product_id));
                }
                let line_total = product.price.checked_mul(quantity).ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::ValueOutOfRange,
                        "Line total exceeds the supported amount",
                    )
                    .with_detail("product_id", product_id.clone())
                })?;
                Ok(OrderItem {
                    product_id,
                    quantity,
                    name: product.name.clone(),
                    unit_price: product.price,
                    line_total,
                })
            })
            .collect()
    }

    // ========================================================================
    // Customer operations
    // ========================================================================

    /// 创建草稿订单；订单号已存在时原地更新
    ///
    /// 返回 `(订单, 是否为更新)`
    pub async fn create_order(
        &self,
        user: &CurrentUser,
        req: CreateOrderRequest,
    ) -> AppResult<(Order, bool)> {
        let order_number = req.order_number.trim().to_string();
        validate_required_text(&order_number, "order_number", MAX_ORDER_NUMBER_LEN)?;
        validate_optional_text(&req.note, "note", MAX_NOTE_LEN)?;
        if let Some(address) = &req.shipping_address {
            validate_shipping_address(address)?;
        }
        let items = self.build_items(&req.items).await?;

        if let Some(existing) = self.orders.find_by_number(&order_number).await? {
            let order = self.update_draft(user, existing, items, req).await?;
            return Ok((order, true));
        }

        let mut order = Order::draft(
            uuid::Uuid::new_v4().to_string(),
            order_number.clone(),
            user.user_id.clone(),
            items.clone(),
            now_millis(),
        )?;
        order.shipping_address = req.shipping_address.clone();
        order.payment_method = req.payment_method;
        order.note = req.note.clone();

        match self.orders.create(&order).await {
            Ok(()) => {}
            Err(RepoError::Duplicate(_)) => {
                // 并发创建同一订单号，另一请求先写入
                tracing::info!(order_number = %order_number, "Concurrent create, updating existing order");
                let existing = self.load(&order_number).await?;
                let order = self.update_draft(user, existing, items, req).await?;
                return Ok((order, true));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(
            order_number = %order.order_number,
            user_id = %user.user_id,
            total = order.total_price,
            "Draft order created"
        );
        self.notify(EventType::OrderCreated, &order);
        Ok((order, false))
    }

    /// 用新的订单行和可选字段覆盖已有草稿
    async fn update_draft(
        &self,
        user: &CurrentUser,
        mut order: Order,
        items: Vec<OrderItem>,
        req: CreateOrderRequest,
    ) -> AppResult<Order> {
        if order.user_id != user.user_id {
            return Err(AppError::permission_denied(format!(
                "Order {} belongs to another user",
                order.order_number
            )));
        }
        if order.status != OrderStatus::Draft {
            return Err(AppError::with_message(
                ErrorCode::OrderNotDraft,
                format!(
                    "Order {} is {} and can no longer be edited",
                    order.order_number, order.status
                ),
            )
            .with_detail("status", order.status.as_str()));
        }

        order.items = items;
        if req.shipping_address.is_some() {
            order.shipping_address = req.shipping_address;
        }
        if req.payment_method.is_some() {
            order.payment_method = req.payment_method;
        }
        if req.note.is_some() {
            order.note = req.note;
        }
        order.recalculate_totals()?;
        order.record("Order updated", now_millis());

        self.orders.save(&order).await?;
        tracing::info!(order_number = %order.order_number, user_id = %user.user_id, "Draft order updated");
        self.notify(EventType::OrderUpdated, &order);
        Ok(order)
    }

    /// 结账：Draft → Pending，货到付款直接视为已支付
    pub async fn purchase_order(
        &self,
        user: &CurrentUser,
        order_number: &str,
        req: PurchaseOrderRequest,
    ) -> AppResult<Order> {
        validate_shipping_address(&req.shipping_address)?;
        validate_amount(req.shipping_fee, "shipping_fee", MAX_SHIPPING_FEE)?;
        validate_optional_text(&req.note, "note", MAX_NOTE_LEN)?;

        let mut order = self.load_owned(user, order_number).await?;
        if order.status != OrderStatus::Draft {
            return Err(AppError::with_message(
                ErrorCode::OrderNotDraft,
                format!("Order {} has already been purchased", order_number),
            )
            .with_detail("status", order.status.as_str()));
        }

        let now = now_millis();
        order.shipping_address = Some(req.shipping_address);
        order.payment_method = Some(req.payment_method);
        order.shipping_fee = req.shipping_fee;
        if req.note.is_some() {
            order.note = req.note;
        }
        order.recalculate_totals()?;
        order.status = OrderStatus::Pending;
        order.purchased_at = Some(now);
        if req.payment_method.is_cash() {
            order.mark_paid(now);
        }
        order.record(format!("Order purchased ({})", req.payment_method), now);

        self.orders.save(&order).await?;
        tracing::info!(
            order_number = %order_number,
            method = %req.payment_method,
            total = order.total_price,
            "Order purchased"
        );
        self.notify(EventType::OrderPurchased, &order);
        Ok(order)
    }

    /// 为待支付的非现金订单向渠道申请支付链接
    ///
    /// 每次调用生成新的 `payment_ref`，旧链接的回调不再能匹配到订单。
    pub async fn create_payment_link(
        &self,
        user: &CurrentUser,
        order_number: &str,
    ) -> AppResult<PaymentLink> {
        let mut order = self.load_owned(user, order_number).await?;

        if order.is_paid() {
            return Err(AppError::new(ErrorCode::OrderAlreadyPaid)
                .with_detail("order_number", order_number));
        }
        if order.status != OrderStatus::Pending {
            return Err(AppError::with_message(
                ErrorCode::OrderNotPayable,
                format!("Order {} is {}, not awaiting payment", order_number, order.status),
            )
            .with_detail("status", order.status.as_str()));
        }
        let method = order
            .payment_method
            .filter(|m| !m.is_cash())
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::PaymentInvalidMethod,
                    "Order is not paid through an online provider",
                )
            })?;
        let gateway = self
            .payments
            .for_method(method)
            .ok_or_else(|| AppError::new(ErrorCode::PaymentInvalidMethod))?;

        let payment_ref = snowflake_id().to_string();
        let request = PaymentLinkRequest {
            payment_ref: payment_ref.clone(),
            order_number: order.order_number.clone(),
            amount: order.total_price,
            description: format!("Order {}", order.order_number),
        };
        let checkout_url = gateway.create_payment_link(&request).await.map_err(|e| {
            tracing::error!(order_number = %order_number, method = %method, error = %e, "Payment link request failed");
            AppError::from(e)
        })?;

        let now = now_millis();
        order.payment_ref = Some(payment_ref.clone());
        if order.paying_status == PayingStatus::Failed {
            order.paying_status = PayingStatus::Unpaid;
        }
        order.record(format!("Payment link created ({})", method), now);
        self.orders.save(&order).await?;

        tracing::info!(order_number = %order_number, payment_ref = %payment_ref, "Payment link created");
        Ok(PaymentLink {
            order_number: order.order_number,
            payment_method: method,
            payment_ref,
            checkout_url,
        })
    }

    /// 处理渠道回调 (IPN)
    ///
    /// 签名无效时不修改任何订单。已支付订单的重复回调直接确认。
    pub async fn confirm_payment(&self, method: PaymentMethod, body: &[u8]) -> AppResult<Order> {
        let gateway = self
            .payments
            .for_method(method)
            .ok_or_else(|| AppError::new(ErrorCode::PaymentInvalidMethod))?;

        let notification = gateway.parse_notification(body).map_err(|e| {
            tracing::warn!(method = %method, error = %e, "Rejected payment notification");
            AppError::from(e)
        })?;

        let mut order = self
            .orders
            .find_by_payment_ref(&notification.payment_ref)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderNotFound,
                    format!("No order for payment reference {}", notification.payment_ref),
                )
                .with_detail("payment_ref", notification.payment_ref.clone())
            })?;

        if order.is_paid() {
            tracing::info!(
                order_number = %order.order_number,
                payment_ref = %notification.payment_ref,
                "Duplicate payment notification for paid order"
            );
            return Ok(order);
        }

        let now = now_millis();
        if notification.success {
            if notification.amount != order.total_price {
                tracing::warn!(
                    order_number = %order.order_number,
                    expected = order.total_price,
                    received = notification.amount,
                    "Payment amount mismatch"
                );
                return Err(AppError::new(ErrorCode::PaymentAmountMismatch)
                    .with_detail("expected", order.total_price)
                    .with_detail("received", notification.amount));
            }
            order.mark_paid(now);
            let action = match &notification.transaction_id {
                Some(tx) => format!("Payment confirmed by {} (transaction {})", method, tx),
                None => format!("Payment confirmed by {}", method),
            };
            order.record(action, now);
            tracing::info!(order_number = %order.order_number, method = %method, "Payment confirmed");

            // 取消后才到账：保证有退款路径
            if order.status.is_cancelled() && !order.requires_refund {
                order.requires_refund = true;
                order.record("Refund required: paid after cancellation", now);
            }
            if order.status.is_cancelled() {
                tracing::warn!(
                    order_number = %order.order_number,
                    refund_status = %order.refund_status,
                    "Payment received for cancelled order"
                );
            }
        } else {
            order.paying_status = PayingStatus::Failed;
            order.record(format!("Payment failed: {}", notification.message), now);
            tracing::info!(
                order_number = %order.order_number,
                method = %method,
                reason = %notification.message,
                "Payment failed"
            );
        }

        self.orders.save(&order).await?;
        self.notify(EventType::PaymentStatusChanged, &order);
        Ok(order)
    }

    /// 顾客取消订单，只允许 Draft / Pending
    pub async fn cancel_order(
        &self,
        user: &CurrentUser,
        order_number: &str,
        req: CancelOrderRequest,
    ) -> AppResult<Order> {
        validate_optional_text(&req.reason, "reason", MAX_NOTE_LEN)?;
        if let Some(bank) = &req.refund_bank {
            validate_refund_bank(bank)?;
        }

        let mut order = self.load_owned(user, order_number).await?;
        if !order.status.can_customer_cancel() {
            return Err(AppError::with_message(
                ErrorCode::OrderNotCancellable,
                format!("Order {} is {} and can no longer be cancelled", order_number, order.status),
            )
            .with_detail("status", order.status.as_str()));
        }

        order.mark_cancelled(OrderStatus::Cancelled, req.reason, req.refund_bank, now_millis());
        self.orders.save(&order).await?;

        tracing::info!(
            order_number = %order_number,
            requires_refund = order.requires_refund,
            refund_status = %order.refund_status,
            "Order cancelled by customer"
        );
        self.notify(EventType::OrderCancelled, &order);
        Ok(order)
    }

    /// 为已取消且需要退款的订单登记收款账户
    pub async fn request_refund(
        &self,
        user: &CurrentUser,
        order_number: &str,
        req: RefundRequest,
    ) -> AppResult<Order> {
        validate_refund_bank(&req.refund_bank)?;

        let mut order = self.load_owned(user, order_number).await?;
        if !(order.status.is_cancelled()
            && order.requires_refund
            && order.refund_status == RefundStatus::NotInitiated)
        {
            return Err(AppError::new(ErrorCode::RefundNotAllowed)
                .with_detail("status", order.status.as_str())
                .with_detail("refund_status", order.refund_status.as_str())
                .with_detail("requires_refund", order.requires_refund));
        }

        let now = now_millis();
        order.refund_bank = Some(req.refund_bank);
        order.refund_status = RefundStatus::Pending;
        order.record("Refund requested", now);
        self.orders.save(&order).await?;

        tracing::info!(order_number = %order_number, "Refund requested");
        self.notify(EventType::RefundStatusChanged, &order);
        Ok(order)
    }

    // ========================================================================
    // Administrative setters
    // ========================================================================

    pub async fn update_order_status(&self, order_number: &str, raw: &str) -> AppResult<Order> {
        let status: OrderStatus = parse_enum(raw, ErrorCode::InvalidOrderStatus)?;
        let mut order = self.load(order_number).await?;
        let previous = order.status;
        let now = now_millis();

        if status.is_cancelled() && !previous.is_cancelled() {
            order.mark_cancelled(status, None, None, now);
        } else {
            order.status = status;
            if status == OrderStatus::Delivered {
                order.delivered_at = Some(now);
            }
            order.record(format!("Status changed: {} -> {}", previous, status), now);
        }

        self.orders.save(&order).await?;
        tracing::info!(order_number = %order_number, from = %previous, to = %status, "Order status updated");
        self.notify(EventType::OrderStatusChanged, &order);
        Ok(order)
    }

    pub async fn update_payment_status(&self, order_number: &str, raw: &str) -> AppResult<Order> {
        let status: PayingStatus = parse_enum(raw, ErrorCode::InvalidPaymentStatus)?;
        let mut order = self.load(order_number).await?;
        let previous = order.paying_status;
        let now = now_millis();

        if status == PayingStatus::Paid {
            order.mark_paid(now);
        } else {
            order.paying_status = status;
        }
        order.record(format!("Paying status changed: {} -> {}", previous, status), now);

        self.orders.save(&order).await?;
        tracing::info!(order_number = %order_number, from = %previous, to = %status, "Paying status updated");
        self.notify(EventType::PaymentStatusChanged, &order);
        Ok(order)
    }

    pub async fn update_refund_status(&self, order_number: &str, raw: &str) -> AppResult<Order> {
        let status: RefundStatus = parse_enum(raw, ErrorCode::InvalidRefundStatus)?;
        let mut order = self.load(order_number).await?;
        let previous = order.refund_status;

        if status.rank() < previous.rank() {
            tracing::warn!(
                order_number = %order_number,
                from = %previous,
                to = %status,
                "Refund status moved backwards"
            );
        }

        let now = now_millis();
        order.refund_status = status;
        order.record(format!("Refund status changed: {} -> {}", previous, status), now);

        self.orders.save(&order).await?;
        tracing::info!(order_number = %order_number, from = %previous, to = %status, "Refund status updated");
        self.notify(EventType::RefundStatusChanged, &order);
        Ok(order)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_order(&self, user: &CurrentUser, order_number: &str) -> AppResult<Order> {
        let order = self.load(order_number).await?;
        if !user.can_read(&order.user_id) {
            return Err(AppError::permission_denied(format!(
                "Order {} belongs to another user",
                order_number
            )));
        }
        Ok(order)
    }

    /// 顾客只能看到自己的订单；管理员可按用户过滤
    pub async fn list_orders(
        &self,
        user: &CurrentUser,
        query: OrderListQuery,
    ) -> AppResult<OrderPage> {
        let status = query
            .status
            .as_deref()
            .map(|s| parse_enum::<OrderStatus>(s, ErrorCode::InvalidOrderStatus))
            .transpose()?;

        let user_id = if user.is_admin() {
            query.user_id
        } else {
            match query.user_id {
                Some(other) if other != user.user_id => {
                    return Err(AppError::permission_denied(
                        "Customers can only list their own orders",
                    ));
                }
                _ => Some(user.user_id.clone()),
            }
        };

        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0);

        let all = self.orders.list(&OrderFilter { user_id, status }).await?;
        let total = all.len();
        let orders = all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(OrderPage {
            orders,
            total,
            limit,
            offset,
        })
    }

    // ========================================================================
    // Reports
    // ========================================================================

    pub async fn revenue_report(&self, period: ReportPeriod) -> AppResult<RevenueComparison> {
        let now = now_millis();
        let w = Windows::new(period, now);
        let orders = self
            .orders
            .find_created_between(w.previous_start, w.end + 1)
            .await?;
        Ok(reports::revenue_comparison(&orders, period, now))
    }

    pub async fn order_report(&self, period: ReportPeriod) -> AppResult<OrderComparison> {
        let now = now_millis();
        let w = Windows::new(period, now);
        let orders = self
            .orders
            .find_created_between(w.previous_start, w.end + 1)
            .await?;
        Ok(reports::order_comparison(&orders, period, now))
    }

    pub async fn top_ordered_products(&self, limit: usize) -> AppResult<Vec<TopOrderedProduct>> {
        let orders = self.orders.find_placed().await?;
        Ok(reports::top_ordered(&orders, limit))
    }

    pub async fn top_rated_products(&self, limit: usize) -> AppResult<Vec<TopRatedProduct>> {
        let products = self.products.find_all().await?;
        Ok(reports::top_rated(&products, limit))
    }
}

/// Report list size from the query string
pub fn report_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_REPORT_LIMIT)
        .clamp(1, MAX_REPORT_LIMIT)
}
