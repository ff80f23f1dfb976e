//! REST API 处理器
//!
//! 请求层的职责：提取调用者身份、参数校验、调用业务服务、
//! 将错误类型映射为 HTTP 状态码（由 `CommerceError` 完成）。

pub mod booking;
pub mod store;
pub mod wallet;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::CommerceError;

/// 调用者身份提取器
///
/// 身份由上游身份服务解析后通过 `x-user-id` 头注入，
/// 核心信任该值，不做二次认证。
pub struct OwnerId(pub String);

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = CommerceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(CommerceError::MissingIdentity)?;

        Ok(Self(owner_id.to_string()))
    }
}
