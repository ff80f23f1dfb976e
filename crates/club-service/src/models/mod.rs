//! 领域模型定义

pub mod class;
pub mod enums;
pub mod store;
pub mod wallet;

pub use class::{Booking, ClassSession, UpcomingBooking};
pub use enums::{LedgerKind, OrderStatus};
pub use store::{Order, OrderLine, Product};
pub use wallet::{LedgerEntry, Wallet};
