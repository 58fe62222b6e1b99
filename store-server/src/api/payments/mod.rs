//! 支付渠道回调
//!
//! 回调由渠道服务器直接调用，不携带用户身份；可信度完全来自签名校验。

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/payments", payment_routes())
}

fn payment_routes() -> Router<ServerState> {
    Router::new()
        .route("/momo/ipn", post(handler::momo_ipn))
        .route("/payos/webhook", post(handler::payos_webhook))
}
