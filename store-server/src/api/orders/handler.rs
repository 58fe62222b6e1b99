//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::models::{
    CancelOrderRequest, CreateOrderRequest, Order, OrderListQuery, OrderPage, PaymentLink,
    PurchaseOrderRequest, RefundRequest, StatusUpdateRequest,
};

use crate::auth::{AdminUser, CurrentUser};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

/// POST /api/v1/orders - 创建草稿订单 (订单号已存在时更新)
///
/// 新建返回 201，更新返回 200
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, ApiResponse<Order>)> {
    let (order, updated) = state.orders().create_order(&user, payload).await?;
    if updated {
        Ok((
            StatusCode::OK,
            ApiResponse::success_with_message("Order updated", order),
        ))
    } else {
        Ok((
            StatusCode::CREATED,
            ApiResponse::success_with_message("Order created", order),
        ))
    }
}

/// GET /api/v1/orders - 订单列表
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<ApiResponse<OrderPage>> {
    let page = state.orders().list_orders(&user, query).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/v1/orders/:order_number
pub async fn get_by_number(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_number): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders().get_order(&user, &order_number).await?;
    Ok(ApiResponse::success(order))
}

/// POST /api/v1/orders/:order_number/purchase - 结账
pub async fn purchase(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_number): Path<String>,
    Json(payload): Json<PurchaseOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .orders()
        .purchase_order(&user, &order_number, payload)
        .await?;
    Ok(ApiResponse::success(order))
}

/// POST /api/v1/orders/:order_number/payment-link - 获取渠道支付链接
pub async fn payment_link(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_number): Path<String>,
) -> AppResult<ApiResponse<PaymentLink>> {
    let link = state
        .orders()
        .create_payment_link(&user, &order_number)
        .await?;
    Ok(ApiResponse::success(link))
}

/// POST /api/v1/orders/:order_number/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_number): Path<String>,
    Json(payload): Json<CancelOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .orders()
        .cancel_order(&user, &order_number, payload)
        .await?;
    Ok(ApiResponse::success(order))
}

/// POST /api/v1/orders/:order_number/refund-request
pub async fn request_refund(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_number): Path<String>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .orders()
        .request_refund(&user, &order_number, payload)
        .await?;
    Ok(ApiResponse::success(order))
}

// =============================================================================
// Admin setters
// =============================================================================

/// PUT /api/v1/orders/:order_number/status
pub async fn update_status(
    State(state): State<ServerState>,
    AdminUser(admin): AdminUser,
    Path(order_number): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<ApiResponse<Order>> {
    tracing::debug!(admin = %admin.user_id, order_number = %order_number, "Admin status update");
    let order = state
        .orders()
        .update_order_status(&order_number, &payload.status)
        .await?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/v1/orders/:order_number/payment-status
pub async fn update_payment_status(
    State(state): State<ServerState>,
    AdminUser(admin): AdminUser,
    Path(order_number): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<ApiResponse<Order>> {
    tracing::debug!(admin = %admin.user_id, order_number = %order_number, "Admin paying status update");
    let order = state
        .orders()
        .update_payment_status(&order_number, &payload.status)
        .await?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/v1/orders/:order_number/refund-status
pub async fn update_refund_status(
    State(state): State<ServerState>,
    AdminUser(admin): AdminUser,
    Path(order_number): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<ApiResponse<Order>> {
    tracing::debug!(admin = %admin.user_id, order_number = %order_number, "Admin refund status update");
    let order = state
        .orders()
        .update_refund_status(&order_number, &payload.status)
        .await?;
    Ok(ApiResponse::success(order))
}
