//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::models::{Product, ProductCreate, RatingCreate};
use shared::util::now_millis;

use crate::auth::{AdminUser, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::ProductRepository;
use crate::utils::validation::{MAX_NAME_LEN, MAX_UNIT_PRICE, validate_required_text};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};

/// GET /api/v1/products - 获取在售商品
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Product>>> {
    let repo = ProductRepository::new(state.get_db());
    let products = repo.find_all_active().await?;
    Ok(ApiResponse::success(products))
}

/// GET /api/v1/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Product>> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::product_not_found(&id))?;
    Ok(ApiResponse::success(product))
}

/// POST /api/v1/products - 创建商品 (管理员)
pub async fn create(
    State(state): State<ServerState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<(StatusCode, ApiResponse<Product>)> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    if !(0..=MAX_UNIT_PRICE).contains(&payload.price) {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!("price must be between 0 and {MAX_UNIT_PRICE}"),
        )
        .with_detail("price", payload.price));
    }

    let repo = ProductRepository::new(state.get_db());
    let product = repo.create(payload, now_millis()).await?;

    tracing::info!(
        product_id = %product.product_id,
        name = %product.name,
        admin = %admin.user_id,
        "Product created"
    );
    Ok((StatusCode::CREATED, ApiResponse::success(product)))
}

/// POST /api/v1/products/:id/ratings - 评分 1..=5
pub async fn add_rating(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<RatingCreate>,
) -> AppResult<ApiResponse<Product>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "rating must be between 1 and 5",
        )
        .with_detail("rating", payload.rating));
    }

    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .add_rating(&id, payload.rating, now_millis())
        .await
        .map_err(|e| match e {
            crate::db::repository::RepoError::NotFound(_) => AppError::product_not_found(&id),
            other => other.into(),
        })?;

    tracing::debug!(product_id = %id, user_id = %user.user_id, rating = payload.rating, "Product rated");
    Ok(ApiResponse::success(product))
}
