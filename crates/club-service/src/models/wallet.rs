//! 钱包与账本模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::LedgerKind;

/// 用户钱包
///
/// 每个用户一个，余额只能通过账本产生的借贷操作变动，
/// 不允许从请求直接赋值。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: i64,
    pub owner_id: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 账本条目
///
/// 写入后不可变更。同一用户全部条目的有符号和必须等于钱包余额。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: i64,
    pub owner_id: String,
    /// 恒为正，方向由 kind 决定
    pub amount: Decimal,
    pub kind: LedgerKind,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
