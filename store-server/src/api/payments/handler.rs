//! Payment Callback Handlers
//!
//! 原始请求体直接交给渠道校验签名，不经过 Json extractor。

use axum::{body::Bytes, extract::State, http::StatusCode};
use shared::models::PaymentMethod;

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

/// POST /api/v1/payments/momo/ipn
///
/// MoMo 期望 204 No Content
pub async fn momo_ipn(State(state): State<ServerState>, body: Bytes) -> AppResult<StatusCode> {
    state
        .orders()
        .confirm_payment(PaymentMethod::Momo, &body)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/payments/payos/webhook
pub async fn payos_webhook(
    State(state): State<ServerState>,
    body: Bytes,
) -> AppResult<ApiResponse<()>> {
    state
        .orders()
        .confirm_payment(PaymentMethod::PayOs, &body)
        .await?;
    Ok(ApiResponse::ok())
}
