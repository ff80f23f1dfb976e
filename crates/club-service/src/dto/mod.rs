//! 请求层 DTO 定义

pub mod request;
pub mod response;

pub use request::{CreateOrderRequest, CreditWalletRequest, ListQuery};
pub use response::{ApiResponse, WalletDto};
