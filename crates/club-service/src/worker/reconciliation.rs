//! 订单对账 Worker
//!
//! 定期扫描"待结算且已员工确认"的订单，逐单驱动订单流水线结算。
//! 单个订单的失败被隔离：进入 Error 终态并记录日志，
//! 不影响同一轮其余订单，也绝不让 Worker 自身的循环退出。

use std::sync::Arc;
use std::time::Duration;

use club_shared::config::WorkerConfig;
use tokio::sync::watch;
use tracing::{error, info};

use crate::service::{OrderService, SweepStats};

/// 订单对账 Worker
///
/// 以固定间隔轮询数据库，具有显式的启停生命周期：
/// `run` 循环在收到关停信号后优雅退出。
pub struct ReconciliationWorker {
    order_service: Arc<OrderService>,
    /// 轮询间隔（建议秒级，默认 5 秒）
    poll_interval: Duration,
    /// 每轮处理的最大订单数
    batch_size: i64,
}

impl ReconciliationWorker {
    /// 创建 Worker 实例
    pub fn new(order_service: Arc<OrderService>, poll_interval_secs: u64, batch_size: i64) -> Self {
        Self {
            order_service,
            poll_interval: Duration::from_secs(poll_interval_secs),
            batch_size,
        }
    }

    /// 从配置创建 Worker
    pub fn from_config(order_service: Arc<OrderService>, config: &WorkerConfig) -> Self {
        Self::new(
            order_service,
            config.poll_interval_seconds,
            config.batch_size,
        )
    }

    /// 主循环：按固定间隔执行对账扫描，直到收到关停信号
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval = ?self.poll_interval,
            batch_size = self.batch_size,
            "ReconciliationWorker 已启动"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {
                    let stats = self.run_once().await;
                    if stats.settled > 0 || stats.errored > 0 {
                        info!(
                            settled = stats.settled,
                            errored = stats.errored,
                            "对账扫描完成"
                        );
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("ReconciliationWorker 已停止");
    }

    /// 执行一轮对账扫描
    ///
    /// Worker 自身从不向上抛错：扫表失败仅记录日志，
    /// 返回零统计，等待下一轮。
    pub async fn run_once(&self) -> SweepStats {
        match self.order_service.sweep(self.batch_size).await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "对账扫描出错，等待下一轮");
                SweepStats::default()
            }
        }
    }
}
