//! Order API 模块
//!
//! | 路径 | 方法 | 调用方 |
//! |------|------|--------|
//! | /api/v1/orders | POST / GET | 顾客 / 任意 |
//! | /api/v1/orders/{order_number} | GET | 本人或管理员 |
//! | /api/v1/orders/{order_number}/purchase | POST | 本人 |
//! | /api/v1/orders/{order_number}/payment-link | POST | 本人 |
//! | /api/v1/orders/{order_number}/cancel | POST | 本人 |
//! | /api/v1/orders/{order_number}/refund-request | POST | 本人 |
//! | /api/v1/orders/{order_number}/status | PUT | 管理员 |
//! | /api/v1/orders/{order_number}/payment-status | PUT | 管理员 |
//! | /api/v1/orders/{order_number}/refund-status | PUT | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{order_number}", get(handler::get_by_number))
        .route("/{order_number}/purchase", post(handler::purchase))
        .route("/{order_number}/payment-link", post(handler::payment_link))
        .route("/{order_number}/cancel", post(handler::cancel))
        .route("/{order_number}/refund-request", post(handler::request_refund))
        .route("/{order_number}/status", put(handler::update_status))
        .route(
            "/{order_number}/payment-status",
            put(handler::update_payment_status),
        )
        .route(
            "/{order_number}/refund-status",
            put(handler::update_refund_status),
        )
}
