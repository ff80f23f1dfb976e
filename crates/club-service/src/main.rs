//! 会员俱乐部商业核心服务入口
//!
//! 装配顺序：配置 -> 日志 -> 数据库 -> 仓储 -> 服务 ->
//! 对账 Worker -> REST 服务，退出时先停 Worker 再关连接池。

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use club_shared::{config::AppConfig, database::Database, observability};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use club_commerce::{
    AppState, BookingRepository, BookingService, LedgerRepository, OrderRepository, OrderService,
    ProductRepository, ReconciliationWorker, WalletRepository, WalletService, routes,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 统一加载配置：从 config/{service_name}.toml 加载
    let config = AppConfig::load("club-commerce").unwrap_or_default();

    // 2. 初始化日志
    let obs_config = config.observability.clone().with_service_name("club-commerce");
    observability::init(&obs_config)?;

    info!("Starting club-commerce on {}", config.server_addr());
    info!(environment = %config.environment, "Configuration loaded");

    // 3. 初始化数据库并应用迁移
    let db = Database::connect(&config.database).await?;
    db.run_migrations().await?;
    let pool = db.pool().clone();
    info!("Database connection established");

    // 4. 创建仓储
    let wallet_repo = Arc::new(WalletRepository::new(pool.clone()));
    let ledger_repo = Arc::new(LedgerRepository::new(pool.clone()));
    let product_repo = Arc::new(ProductRepository::new(pool.clone()));
    let order_repo = Arc::new(OrderRepository::new(pool.clone()));
    let booking_repo = Arc::new(BookingRepository::new(pool.clone()));

    // 5. 创建服务
    let wallet_service = Arc::new(WalletService::new(
        wallet_repo.clone(),
        ledger_repo.clone(),
        pool.clone(),
    ));
    let booking_service = Arc::new(BookingService::new(booking_repo.clone(), pool.clone()));
    let order_service = Arc::new(
        OrderService::new(
            order_repo.clone(),
            product_repo.clone(),
            wallet_repo.clone(),
            pool.clone(),
        )
        .with_max_retries(config.worker.max_retries),
    );
    info!("Services initialized");

    // 6. 启动对账 Worker（watch 通道承载关停信号）
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = ReconciliationWorker::from_config(order_service.clone(), &config.worker);
    let worker_handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    // 7. 组装 REST 服务
    let state = AppState::new(
        pool,
        wallet_service,
        booking_service,
        order_service,
        config.worker.batch_size,
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("REST server listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 8. 优雅关停：先停 Worker，再关连接池
    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;
    db.close().await;

    info!("Service shutdown complete");
    Ok(())
}

/// 健康检查端点
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// 优雅关闭信号处理
///
/// 监听 Ctrl+C 和 SIGTERM 信号
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
