//! 后台 Worker 模块

pub mod reconciliation;

pub use reconciliation::ReconciliationWorker;
