//! 钱包服务
//!
//! 处理钱包充值、扣款与流水查询。余额变更与账本写入
//! 永远在同一事务内提交，保证"余额 == 账本有符号和"的核心不变式。

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use crate::error::{CommerceError, Result};
use crate::models::{LedgerEntry, LedgerKind, Wallet};
use crate::repository::{LedgerRepository, NewLedgerEntry, WalletRepository};

/// 流水查询的默认与最大条数
const DEFAULT_HISTORY_LIMIT: i64 = 20;
const MAX_HISTORY_LIMIT: i64 = 100;

/// 钱包服务
pub struct WalletService {
    wallet_repo: Arc<WalletRepository>,
    ledger_repo: Arc<LedgerRepository>,
    pool: PgPool,
}

impl WalletService {
    pub fn new(
        wallet_repo: Arc<WalletRepository>,
        ledger_repo: Arc<LedgerRepository>,
        pool: PgPool,
    ) -> Self {
        Self {
            wallet_repo,
            ledger_repo,
            pool,
        }
    }

    /// 查询钱包
    ///
    /// 钱包缺失不视为错误（请求层呈现零余额视图）。
    pub async fn get_wallet(&self, owner_id: &str) -> Result<Option<Wallet>> {
        self.wallet_repo.get_by_owner(owner_id).await
    }

    /// 开户（账号创建时调用，初始余额 0），幂等
    pub async fn register_wallet(&self, owner_id: &str) -> Result<Wallet> {
        let wallet = self.wallet_repo.create(owner_id).await?;
        info!(owner_id = %owner_id, "钱包已开户");
        Ok(wallet)
    }

    /// 充值
    ///
    /// 金额必须大于 0。事务内：锁定钱包 -> 余额递增 -> 写入 CREDIT 账本条目。
    #[instrument(skip(self), fields(owner_id = %owner_id, amount = %amount))]
    pub async fn credit(&self, owner_id: &str, amount: Decimal, description: &str) -> Result<Wallet> {
        if amount <= Decimal::ZERO {
            return Err(CommerceError::InvalidAmount(amount));
        }

        let mut tx = self.pool.begin().await?;

        let wallet = WalletRepository::get_by_owner_for_update(&mut tx, owner_id)
            .await?
            .ok_or_else(|| CommerceError::WalletNotFound(owner_id.to_string()))?;

        let updated = WalletRepository::apply_delta_in_tx(&mut tx, owner_id, amount).await?;
        LedgerRepository::create_in_tx(
            &mut tx,
            &NewLedgerEntry {
                owner_id: owner_id.to_string(),
                amount,
                kind: LedgerKind::Credit,
                description: description.to_string(),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            owner_id = %owner_id,
            amount = %amount,
            balance_before = %wallet.balance,
            balance_after = %updated.balance,
            "钱包充值成功"
        );

        Ok(updated)
    }

    /// 扣款
    ///
    /// 余额检查与递减处于同一事务同一行锁之下，
    /// 检查与写入之间不存在余额可被他人改动的窗口。
    #[instrument(skip(self), fields(owner_id = %owner_id, amount = %amount))]
    pub async fn debit(&self, owner_id: &str, amount: Decimal, description: &str) -> Result<Wallet> {
        let mut tx = self.pool.begin().await?;
        let updated = Self::debit_in_tx(&mut tx, owner_id, amount, description).await?;
        tx.commit().await?;

        info!(
            owner_id = %owner_id,
            amount = %amount,
            balance_after = %updated.balance,
            "钱包扣款成功"
        );

        Ok(updated)
    }

    /// 在外部事务中执行扣款
    ///
    /// 供订单结算复用：扣款与库存扣减、状态迁移同属一个原子单元。
    /// 锁定钱包行，检查余额，递减余额并写入 DEBIT 账本条目。
    pub async fn debit_in_tx(
        tx: &mut PgConnection,
        owner_id: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<Wallet> {
        if amount <= Decimal::ZERO {
            return Err(CommerceError::InvalidAmount(amount));
        }

        let wallet = WalletRepository::get_by_owner_for_update(tx, owner_id)
            .await?
            .ok_or_else(|| CommerceError::WalletNotFound(owner_id.to_string()))?;

        if wallet.balance < amount {
            return Err(CommerceError::InsufficientFunds {
                required: amount,
                available: wallet.balance,
            });
        }

        let updated = WalletRepository::apply_delta_in_tx(tx, owner_id, -amount).await?;
        LedgerRepository::create_in_tx(
            tx,
            &NewLedgerEntry {
                owner_id: owner_id.to_string(),
                amount,
                kind: LedgerKind::Debit,
                description: description.to_string(),
            },
        )
        .await?;

        Ok(updated)
    }

    /// 查询流水，按时间倒序
    ///
    /// limit 为空时取默认 20 条，上限 100 条。
    pub async fn history(&self, owner_id: &str, limit: Option<i64>) -> Result<Vec<LedgerEntry>> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        self.ledger_repo.list_by_owner(owner_id, limit).await
    }
}
