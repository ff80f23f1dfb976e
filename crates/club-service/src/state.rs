//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use sqlx::PgPool;

use crate::service::{BookingService, OrderService, WalletService};

/// Axum 应用共享状态
///
/// 各业务服务在进程启动时显式装配，通过 Arc 在 handler 间共享。
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL 连接池
    pub pool: PgPool,
    pub wallet_service: Arc<WalletService>,
    pub booking_service: Arc<BookingService>,
    pub order_service: Arc<OrderService>,
    /// 手动触发对账时的单轮上限
    pub sweep_batch_size: i64,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(
        pool: PgPool,
        wallet_service: Arc<WalletService>,
        booking_service: Arc<BookingService>,
        order_service: Arc<OrderService>,
        sweep_batch_size: i64,
    ) -> Self {
        Self {
            pool,
            wallet_service,
            booking_service,
            order_service,
            sweep_batch_size,
        }
    }
}
