//! 钱包仓储
//!
//! 钱包余额只允许在携带账本写入的事务内变动，
//! 因此余额调整方法仅提供事务内版本。

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::Wallet;

const WALLET_COLUMNS: &str = "id, owner_id, balance, created_at, updated_at";

/// 钱包仓储
pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按用户查询钱包
    pub async fn get_by_owner(&self, owner_id: &str) -> Result<Option<Wallet>> {
        let wallet = sqlx::query_as::<_, Wallet>(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// 创建钱包（账号创建时调用，初始余额 0）
    ///
    /// 幂等：钱包已存在时返回现有记录。
    pub async fn create(&self, owner_id: &str) -> Result<Wallet> {
        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            INSERT INTO wallets (owner_id, balance)
            VALUES ($1, 0)
            ON CONFLICT (owner_id) DO UPDATE SET owner_id = EXCLUDED.owner_id
            RETURNING id, owner_id, balance, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// 在事务中锁定并读取钱包（FOR UPDATE）
    ///
    /// 余额检查与变更必须基于同一把行锁，避免检查与写入之间的竞态。
    pub async fn get_by_owner_for_update(
        tx: &mut PgConnection,
        owner_id: &str,
    ) -> Result<Option<Wallet>> {
        let wallet = sqlx::query_as::<_, Wallet>(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE owner_id = $1 FOR UPDATE"
        ))
        .bind(owner_id)
        .fetch_optional(tx)
        .await?;

        Ok(wallet)
    }

    /// 在事务中调整余额（delta 可正可负），返回更新后的钱包
    ///
    /// 调用方必须已持有该行的锁并完成余额检查。
    pub async fn apply_delta_in_tx(
        tx: &mut PgConnection,
        owner_id: &str,
        delta: Decimal,
    ) -> Result<Wallet> {
        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            UPDATE wallets
            SET balance = balance + $2, updated_at = now()
            WHERE owner_id = $1
            RETURNING id, owner_id, balance, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(delta)
        .fetch_one(tx)
        .await?;

        Ok(wallet)
    }
}
