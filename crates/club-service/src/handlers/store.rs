//! 商城 API 处理器
//!
//! 商品目录、订单创建与员工确认、手动对账触发。

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateOrderRequest, ListQuery},
    error::CommerceError,
    handlers::OwnerId,
    models::{Order, Product},
    service::SweepStats,
    state::AppState,
};

const DEFAULT_ORDER_LIMIT: i64 = 20;

/// 商品列表
///
/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Product>>>, CommerceError> {
    let products = state.order_service.list_products().await?;

    Ok(Json(ApiResponse::success(products)))
}

/// 商品详情
///
/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<Product>>, CommerceError> {
    let product = state
        .order_service
        .get_product(product_id)
        .await?
        .ok_or(CommerceError::ProductNotFound(product_id))?;

    Ok(Json(ApiResponse::success(product)))
}

/// 创建订单（Pending，等待员工确认）
///
/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<Order>>, CommerceError> {
    req.validate()?;

    let order = state
        .order_service
        .create(&owner_id, req.product_id)
        .await?;

    Ok(Json(ApiResponse::success(order)))
}

/// 我的订单列表（终态 Error 在此对外可见）
///
/// GET /api/orders?limit=20
pub async fn my_orders(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>, CommerceError> {
    let limit = query.limit.unwrap_or(DEFAULT_ORDER_LIMIT).clamp(1, 100);
    let orders = state.order_service.list_for_owner(&owner_id, limit).await?;

    Ok(Json(ApiResponse::success(orders)))
}

/// 员工确认订单
///
/// POST /api/admin/orders/{id}/approve
pub async fn approve_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, CommerceError> {
    state.order_service.mark_approved(order_id).await?;

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 手动触发一轮对账扫描
///
/// POST /api/admin/reconciliation/run
pub async fn run_sweep(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SweepStats>>, CommerceError> {
    let stats = state.order_service.sweep(state.sweep_batch_size).await?;

    Ok(Json(ApiResponse::success(stats)))
}
