//! 订单仓储
//!
//! 订单与订单行的数据访问，包含对账 Worker 的扫表查询。

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{Order, OrderLine, OrderStatus};

const ORDER_COLUMNS: &str = "id, owner_id, total, status, approved, created_at, updated_at";

/// 订单仓储
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按 ID 查询订单
    pub async fn get(&self, id: i64) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// 用户订单列表，按创建时间倒序
    pub async fn list_by_owner(&self, owner_id: &str, limit: i64) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// 在事务中创建订单（Pending、未确认）
    pub async fn create_in_tx(
        tx: &mut PgConnection,
        owner_id: &str,
        total: Decimal,
    ) -> Result<Order> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (owner_id, total, status, approved)
            VALUES ($1, $2, 'pending', false)
            RETURNING id, owner_id, total, status, approved, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(total)
        .fetch_one(tx)
        .await?;

        Ok(order)
    }

    /// 在事务中添加订单行
    pub async fn add_line_in_tx(
        tx: &mut PgConnection,
        order_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<OrderLine> {
        let line = sqlx::query_as::<_, OrderLine>(
            r#"
            INSERT INTO order_lines (order_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, order_id, product_id, quantity
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(tx)
        .await?;

        Ok(line)
    }

    /// 员工确认订单（approved=true），不改变其他字段
    ///
    /// 返回是否命中记录。确认不是状态机迁移，只是让订单
    /// 进入对账 Worker 的扫描范围。
    pub async fn mark_approved(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET approved = true, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 在事务中锁定并读取订单（FOR UPDATE）
    ///
    /// 对账扫描与人工重试对同一订单的结算通过这把行锁互斥。
    pub async fn get_for_update(tx: &mut PgConnection, id: i64) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(order)
    }

    /// 在事务中读取订单行
    pub async fn get_line_in_tx(tx: &mut PgConnection, order_id: i64) -> Result<Option<OrderLine>> {
        let line = sqlx::query_as::<_, OrderLine>(
            "SELECT id, order_id, product_id, quantity FROM order_lines WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(tx)
        .await?;

        Ok(line)
    }

    /// 在事务中迁移订单状态
    pub async fn set_status_in_tx(
        tx: &mut PgConnection,
        id: i64,
        status: OrderStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(tx)
            .await?;

        Ok(())
    }

    /// 将仍处于 Pending 的订单置为 Error 终态
    ///
    /// 结算事务回滚后的收尾写入。条件写保证不会覆盖
    /// 已经 Completed 的订单。
    pub async fn mark_error_if_pending(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE orders SET status = 'error', updated_at = now() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 对账扫表：待结算且已确认的订单
    pub async fn list_pending_approved(&self, limit: i64) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE status = 'pending' AND approved = true \
             ORDER BY created_at ASC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}
