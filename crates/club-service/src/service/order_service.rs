//! 订单流水线服务
//!
//! 管理商城订单从创建到结算的完整状态机：
//! Pending -> Completed（成功终态）| Error（失败终态）。
//!
//! ## 结算流程
//!
//! 1. 锁定订单行（幂等检查：终态订单直接跳过）
//! 2. 结算时重新校验余额与库存（下单时的检查仅供前端提示，
//!    下单与员工确认之间余额和库存都可能已变化）
//! 3. 校验通过：扣款 + 扣库存 + 置 Completed，同一事务提交
//! 4. 校验失败：回滚后将订单置 Error 终态，不再自动重试

use std::sync::Arc;

use club_shared::retry::{RetryPolicy, retry_with_policy};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info, instrument, warn};

use crate::error::{CommerceError, Result};
use crate::models::{Order, OrderStatus, Product};
use crate::repository::{OrderRepository, ProductRepository, WalletRepository};
use crate::service::WalletService;

/// 单次结算的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// 结算成功，订单进入 Completed
    Completed,
    /// 订单已处于终态，本次为无操作（幂等保证，绝不二次扣款）
    AlreadySettled,
    /// 订单不存在，无事可做
    Missing,
}

/// 一轮对账扫描的统计
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepStats {
    /// 本轮成功结算的订单数
    pub settled: u64,
    /// 本轮进入 Error 终态的订单数
    pub errored: u64,
}

/// 订单流水线服务
pub struct OrderService {
    order_repo: Arc<OrderRepository>,
    product_repo: Arc<ProductRepository>,
    wallet_repo: Arc<WalletRepository>,
    pool: PgPool,
    retry_policy: RetryPolicy,
}

impl OrderService {
    pub fn new(
        order_repo: Arc<OrderRepository>,
        product_repo: Arc<ProductRepository>,
        wallet_repo: Arc<WalletRepository>,
        pool: PgPool,
    ) -> Self {
        Self {
            order_repo,
            product_repo,
            wallet_repo,
            pool,
            retry_policy: RetryPolicy::fast(2),
        }
    }

    /// 覆盖瞬时故障重试次数
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry_policy = RetryPolicy::fast(max_retries);
        self
    }

    /// 创建订单
    ///
    /// 余额与库存检查在此仅为前置提示（advisory）：真正有权威的
    /// 校验发生在结算时。检查全部通过后才写入订单行，
    /// 因此校验失败时不会留下任何订单记录。
    #[instrument(skip(self), fields(owner_id = %owner_id, product_id = product_id))]
    pub async fn create(&self, owner_id: &str, product_id: i64) -> Result<Order> {
        let product = self
            .product_repo
            .get(product_id)
            .await?
            .ok_or(CommerceError::ProductNotFound(product_id))?;

        let wallet = self
            .wallet_repo
            .get_by_owner(owner_id)
            .await?
            .ok_or_else(|| CommerceError::WalletNotFound(owner_id.to_string()))?;

        if product.stock <= 0 {
            return Err(CommerceError::OutOfStock(product_id));
        }

        if wallet.balance < product.price {
            return Err(CommerceError::InsufficientFunds {
                required: product.price,
                available: wallet.balance,
            });
        }

        let mut tx = self.pool.begin().await?;
        let order = OrderRepository::create_in_tx(&mut tx, owner_id, product.price).await?;
        OrderRepository::add_line_in_tx(&mut tx, order.id, product_id, 1).await?;
        tx.commit().await?;

        info!(
            order_id = order.id,
            owner_id = %owner_id,
            product_id = product_id,
            total = %order.total,
            "订单已创建，等待员工确认"
        );

        Ok(order)
    }

    /// 员工确认订单
    ///
    /// 仅翻转 approved 标志，使订单进入对账扫描范围。
    #[instrument(skip(self))]
    pub async fn mark_approved(&self, order_id: i64) -> Result<()> {
        if !self.order_repo.mark_approved(order_id).await? {
            return Err(CommerceError::OrderNotFound(order_id));
        }

        info!(order_id = order_id, "订单已确认，等待对账结算");
        Ok(())
    }

    /// 按 ID 查询订单
    pub async fn get(&self, order_id: i64) -> Result<Option<Order>> {
        self.order_repo.get(order_id).await
    }

    /// 商品列表（只读目录）
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.product_repo.list().await
    }

    /// 商品详情（只读目录）
    pub async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        self.product_repo.get(product_id).await
    }

    /// 用户订单列表（终态 Error 在此对外可见）
    pub async fn list_for_owner(&self, owner_id: &str, limit: i64) -> Result<Vec<Order>> {
        self.order_repo.list_by_owner(owner_id, limit).await
    }

    /// 结算订单
    ///
    /// 瞬时故障（连接抖动、行锁冲突）在有限次数内重试；
    /// 业务前置条件失败或重试耗尽后，订单被置为 Error 终态，
    /// 错误向调用方（对账 Worker）返回用于计数。
    #[instrument(skip(self))]
    pub async fn settle(&self, order_id: i64) -> Result<SettleOutcome> {
        let result = retry_with_policy(
            &self.retry_policy,
            "settle_order",
            CommerceError::is_retryable,
            || self.try_settle(order_id),
        )
        .await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                // 结算失败不向原始请求方同步暴露（请求早已结束），
                // 吸收为订单的 Error 终态，后续读取订单时可见。
                let transitioned = self.order_repo.mark_error_if_pending(order_id).await?;
                if transitioned {
                    warn!(
                        order_id = order_id,
                        error = %err,
                        "结算失败，订单进入 Error 终态"
                    );
                }
                Err(err)
            }
        }
    }

    /// 单次结算尝试，全部写入在一个事务内
    ///
    /// 锁顺序固定为 订单 -> 商品 -> 钱包，避免与其他路径死锁。
    /// 订单行锁同时承担结算互斥：对账扫描与人工重试并发结算
    /// 同一订单时，后到者会看到终态并空操作。
    async fn try_settle(&self, order_id: i64) -> Result<SettleOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(order) = OrderRepository::get_for_update(&mut tx, order_id).await? else {
            return Ok(SettleOutcome::Missing);
        };

        if order.status.is_terminal() {
            return Ok(SettleOutcome::AlreadySettled);
        }

        let line = OrderRepository::get_line_in_tx(&mut tx, order_id)
            .await?
            .ok_or_else(|| {
                CommerceError::Internal(format!("订单缺少订单行: order_id={order_id}"))
            })?;

        let product = ProductRepository::get_for_update(&mut tx, line.product_id)
            .await?
            .ok_or(CommerceError::ProductNotFound(line.product_id))?;

        if product.stock < line.quantity {
            return Err(CommerceError::OutOfStock(product.id));
        }

        // 扣款（内部锁定钱包行并重新校验余额）
        WalletService::debit_in_tx(
            &mut tx,
            &order.owner_id,
            order.total,
            &format!("Store purchase: {}", product.name),
        )
        .await?;

        ProductRepository::decrement_stock_in_tx(&mut tx, product.id, line.quantity).await?;
        OrderRepository::set_status_in_tx(&mut tx, order_id, OrderStatus::Completed).await?;

        tx.commit().await?;

        info!(
            order_id = order_id,
            owner_id = %order.owner_id,
            product_id = product.id,
            total = %order.total,
            "订单结算完成"
        );

        Ok(SettleOutcome::Completed)
    }

    /// 执行一轮对账扫描
    ///
    /// 逐单独立结算：单个订单失败只影响它自己的计数，
    /// 不会中断同一轮中其余订单的处理。
    pub async fn sweep(&self, batch_size: i64) -> Result<SweepStats> {
        let orders = self.order_repo.list_pending_approved(batch_size).await?;

        if orders.is_empty() {
            return Ok(SweepStats::default());
        }

        info!(count = orders.len(), "发现待结算订单");

        let mut stats = SweepStats::default();
        for order in orders {
            match self.settle(order.id).await {
                Ok(SettleOutcome::Completed) => stats.settled += 1,
                Ok(_) => {
                    // 已是终态或已消失，无需计数
                }
                Err(err) => {
                    stats.errored += 1;
                    error!(order_id = order.id, error = %err, "订单结算失败");

                    // settle 内部可能因数据库故障未完成终态化，兜底一次;
                    // 失败则订单保持 Pending，留待下轮扫描
                    if let Err(e) = self.order_repo.mark_error_if_pending(order.id).await {
                        error!(order_id = order.id, error = %e, "订单终态化失败");
                    }
                }
            }
        }

        Ok(stats)
    }
}
