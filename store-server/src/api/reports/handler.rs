//! Report API Handlers

use axum::extract::{Query, State};
use shared::models::{
    OrderComparison, ReportPeriod, ReportQuery, RevenueComparison, TopOrderedProduct,
    TopRatedProduct,
};

use crate::auth::AdminUser;
use crate::core::ServerState;
use crate::orders::report_limit;
use crate::utils::{ApiResponse, AppError, AppResult};

/// 缺省为 month
fn parse_period(query: &ReportQuery) -> AppResult<ReportPeriod> {
    match query.period.as_deref() {
        None => Ok(ReportPeriod::default()),
        Some(raw) => raw.parse().map_err(|e: shared::models::UnknownVariant| {
            AppError::validation(e.to_string())
                .with_detail("field", "period")
                .with_detail("valid_values", e.valid.to_vec())
        }),
    }
}

/// GET /api/v1/reports/revenue?period=
pub async fn revenue(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<ApiResponse<RevenueComparison>> {
    let period = parse_period(&query)?;
    let report = state.orders().revenue_report(period).await?;
    Ok(ApiResponse::success(report))
}

/// GET /api/v1/reports/orders?period=
pub async fn orders(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<ApiResponse<OrderComparison>> {
    let period = parse_period(&query)?;
    let report = state.orders().order_report(period).await?;
    Ok(ApiResponse::success(report))
}

/// GET /api/v1/reports/top-ordered?limit=
pub async fn top_ordered(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<ApiResponse<Vec<TopOrderedProduct>>> {
    let top = state
        .orders()
        .top_ordered_products(report_limit(query.limit))
        .await?;
    Ok(ApiResponse::success(top))
}

/// GET /api/v1/reports/top-rated?limit= - 公开
pub async fn top_rated(
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<ApiResponse<Vec<TopRatedProduct>>> {
    let top = state
        .orders()
        .top_rated_products(report_limit(query.limit))
        .await?;
    Ok(ApiResponse::success(top))
}
