//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::{handlers, state::AppState};

/// 构建钱包相关路由
pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/wallet", get(handlers::wallet::get_wallet))
        .route("/wallet/credit", post(handlers::wallet::credit_wallet))
        .route("/wallet/history", get(handlers::wallet::wallet_history))
}

/// 构建课程预约相关路由
pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/classes", get(handlers::booking::list_classes))
        .route(
            "/classes/{id}/bookings",
            post(handlers::booking::reserve_class),
        )
        .route("/bookings", get(handlers::booking::my_bookings))
        .route("/bookings/{id}", delete(handlers::booking::release_booking))
}

/// 构建商城相关路由
///
/// 员工确认与手动对账归于 /admin 之下，由网关侧做角色控制。
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(handlers::store::list_products))
        .route("/products/{id}", get(handlers::store::get_product))
        .route("/orders", post(handlers::store::create_order))
        .route("/orders", get(handlers::store::my_orders))
        .route(
            "/admin/orders/{id}/approve",
            post(handlers::store::approve_order),
        )
        .route(
            "/admin/reconciliation/run",
            post(handlers::store::run_sweep),
        )
}

/// 组合全部 API 路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(wallet_routes())
        .merge(booking_routes())
        .merge(store_routes())
}
