//! 数据库仓储层
//!
//! 按聚合划分的数据访问：读写方法基于连接池，
//! 需要参与外部事务的方法以 `*_in_tx` 形式接收 `PgConnection`。

pub mod booking_repo;
pub mod ledger_repo;
pub mod order_repo;
pub mod product_repo;
pub mod wallet_repo;

pub use booking_repo::BookingRepository;
pub use ledger_repo::{LedgerRepository, NewLedgerEntry};
pub use order_repo::OrderRepository;
pub use product_repo::ProductRepository;
pub use wallet_repo::WalletRepository;
