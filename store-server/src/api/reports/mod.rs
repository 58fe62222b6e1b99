//! Report API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/reports", report_routes())
}

fn report_routes() -> Router<ServerState> {
    Router::new()
        .route("/revenue", get(handler::revenue))
        .route("/orders", get(handler::orders))
        .route("/top-ordered", get(handler::top_ordered))
        .route("/top-rated", get(handler::top_rated))
}
