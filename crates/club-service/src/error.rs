//! 商业核心错误类型
//!
//! 定义预约、钱包、订单流水线的业务错误和系统错误，
//! 并提供到 HTTP 状态码的映射（请求层负责序列化）。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

/// 商业核心错误类型
#[derive(Debug, Error)]
pub enum CommerceError {
    // === 课程预约相关错误 ===
    #[error("课程不存在: {0}")]
    ClassNotFound(i64),

    #[error("课程已满员: class_id={0}")]
    ClassFull(i64),

    #[error("已预约过该课程: owner_id={owner_id}, class_id={class_id}")]
    AlreadyBooked { owner_id: String, class_id: i64 },

    #[error("预约不存在: {0}")]
    BookingNotFound(i64),

    #[error("无权操作该预约: booking_id={0}")]
    Forbidden(i64),

    // === 钱包相关错误 ===
    #[error("钱包不存在: owner_id={0}")]
    WalletNotFound(String),

    #[error("余额不足: 需要 {required}, 可用 {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("金额无效，必须大于 0: {0}")]
    InvalidAmount(Decimal),

    // === 商城订单相关错误 ===
    #[error("商品不存在: {0}")]
    ProductNotFound(i64),

    #[error("商品库存不足: product_id={0}")]
    OutOfStock(i64),

    #[error("订单不存在: {0}")]
    OrderNotFound(i64),

    // === 请求层错误 ===
    #[error("缺少调用者身份")]
    MissingIdentity,

    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),

    #[error("并发冲突，请重试")]
    ConcurrencyConflict,
}

/// 商业核心 Result 类型别名
pub type Result<T> = std::result::Result<T, CommerceError>;

impl CommerceError {
    /// 检查是否为可重试的错误
    ///
    /// 仅基础设施层的瞬时故障可重试；业务前置条件失败必须立刻终态化。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::ConcurrencyConflict)
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::ConcurrencyConflict
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ClassNotFound(_) => "CLASS_NOT_FOUND",
            Self::ClassFull(_) => "CLASS_FULL",
            Self::AlreadyBooked { .. } => "ALREADY_BOOKED",
            Self::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::WalletNotFound(_) => "WALLET_NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::OutOfStock(_) => "OUT_OF_STOCK",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::MissingIdentity => "MISSING_IDENTITY",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
        }
    }

    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ClassNotFound(_)
            | Self::BookingNotFound(_)
            | Self::WalletNotFound(_)
            | Self::ProductNotFound(_)
            | Self::OrderNotFound(_) => StatusCode::NOT_FOUND,

            Self::ClassFull(_) | Self::AlreadyBooked { .. } | Self::ConcurrencyConflict => {
                StatusCode::CONFLICT
            }

            Self::InsufficientFunds { .. } | Self::OutOfStock(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            Self::Forbidden(_) => StatusCode::FORBIDDEN,

            Self::MissingIdentity => StatusCode::UNAUTHORIZED,

            Self::InvalidAmount(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,

            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for CommerceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl IntoResponse for CommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}
