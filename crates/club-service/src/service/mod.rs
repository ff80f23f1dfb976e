//! 业务服务层

pub mod booking_service;
pub mod order_service;
pub mod wallet_service;

pub use booking_service::BookingService;
pub use order_service::{OrderService, SettleOutcome, SweepStats};
pub use wallet_service::WalletService;
