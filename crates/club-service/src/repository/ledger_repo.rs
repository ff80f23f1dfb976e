//! 钱包账本仓储
//!
//! 提供余额变动流水的数据访问。账本条目只增不改，
//! 是"余额为什么变了"的唯一权威记录。

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{LedgerEntry, LedgerKind};

/// 新账本条目
///
/// 插入参数，id 和 created_at 由数据库生成。
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub owner_id: String,
    pub amount: Decimal,
    pub kind: LedgerKind,
    pub description: String,
}

/// 钱包账本仓储
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中写入账本条目
    ///
    /// 必须与对应的余额变更在同一事务内提交，返回新条目的 ID。
    pub async fn create_in_tx(tx: &mut PgConnection, entry: &NewLedgerEntry) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO ledger_entries (owner_id, amount, kind, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&entry.owner_id)
        .bind(entry.amount)
        .bind(entry.kind)
        .bind(&entry.description)
        .fetch_one(tx)
        .await?;

        Ok(id)
    }

    /// 列出用户的账本条目
    ///
    /// 按时间倒序排列，返回最近的 limit 条记录
    pub async fn list_by_owner(&self, owner_id: &str, limit: i64) -> Result<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, owner_id, amount, kind, description, created_at
            FROM ledger_entries
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// 用户账本的有符号和（credit 计正，debit 计负）
    ///
    /// 用于余额守恒校验：结果必须等于钱包当前余额。
    pub async fn signed_sum(&self, owner_id: &str) -> Result<Decimal> {
        let sum: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(CASE WHEN kind = 'credit' THEN amount ELSE -amount END)
            FROM ledger_entries
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum.unwrap_or(Decimal::ZERO))
    }
}
