//! 会员俱乐部商业核心服务
//!
//! 提供俱乐部后端中真正具有事务不变式的部分：
//!
//! - **课程预约**：容量控制，booked 永不超过 capacity
//! - **钱包账本**：余额只经由产生账本条目的借贷操作变动
//! - **订单流水线**：创建 -> 员工确认 -> 结算的状态机，
//!   结算原子地完成扣款、扣库存与状态迁移
//! - **对账 Worker**：周期性驱动已确认订单结算，
//!   将部分失败转化为订单的 Error 终态而不是进程故障
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层
//! - `worker`: 对账 Worker
//! - `handlers` / `routes` / `dto` / `state`: REST 请求层

pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;
pub mod worker;

pub use error::{CommerceError, Result};
pub use models::*;
pub use repository::{
    BookingRepository, LedgerRepository, OrderRepository, ProductRepository, WalletRepository,
};
pub use service::{BookingService, OrderService, SettleOutcome, SweepStats, WalletService};
pub use state::AppState;
pub use worker::ReconciliationWorker;
