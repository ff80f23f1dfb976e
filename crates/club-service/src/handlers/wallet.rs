//! 钱包 API 处理器

use axum::{
    Json,
    extract::{Query, State},
};
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreditWalletRequest, ListQuery, WalletDto},
    error::CommerceError,
    handlers::OwnerId,
    models::LedgerEntry,
    state::AppState,
};

/// 查询我的钱包
///
/// GET /api/wallet
pub async fn get_wallet(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<ApiResponse<WalletDto>>, CommerceError> {
    let dto = match state.wallet_service.get_wallet(&owner_id).await? {
        Some(wallet) => WalletDto::from(wallet),
        None => WalletDto::zero(&owner_id),
    };

    Ok(Json(ApiResponse::success(dto)))
}

/// 钱包充值
///
/// POST /api/wallet/credit
pub async fn credit_wallet(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<CreditWalletRequest>,
) -> Result<Json<ApiResponse<WalletDto>>, CommerceError> {
    req.validate()?;

    let description = req.description.as_deref().unwrap_or("Account top-up");
    let wallet = state
        .wallet_service
        .credit(&owner_id, req.amount, description)
        .await?;

    Ok(Json(ApiResponse::success(WalletDto::from(wallet))))
}

/// 查询钱包流水，按时间倒序
///
/// GET /api/wallet/history?limit=20
pub async fn wallet_history(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<LedgerEntry>>>, CommerceError> {
    let entries = state.wallet_service.history(&owner_id, query.limit).await?;

    Ok(Json(ApiResponse::success(entries)))
}
