//! 响应 DTO 定义

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Wallet;

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（无数据）
    pub fn success_empty() -> ApiResponse<()> {
        ApiResponse {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: None,
        }
    }
}

/// 钱包视图
///
/// 尚未开户的用户呈现零余额，而不是 404。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDto {
    pub owner_id: String,
    pub balance: Decimal,
}

impl WalletDto {
    pub fn zero(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            balance: Decimal::ZERO,
        }
    }
}

impl From<Wallet> for WalletDto {
    fn from(wallet: Wallet) -> Self {
        Self {
            owner_id: wallet.owner_id,
            balance: wallet.balance,
        }
    }
}
