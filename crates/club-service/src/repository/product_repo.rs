//! 商品仓储

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::Product;

const PRODUCT_COLUMNS: &str = "id, name, price, stock, category, created_at, updated_at";

/// 商品仓储
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按 ID 查询商品
    pub async fn get(&self, id: i64) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// 商品列表
    pub async fn list(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY category, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// 在事务中锁定并读取商品（FOR UPDATE）
    pub async fn get_for_update(tx: &mut PgConnection, id: i64) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(product)
    }

    /// 在事务中扣减库存
    ///
    /// 调用方必须已持有该行的锁并完成库存检查。
    pub async fn decrement_stock_in_tx(
        tx: &mut PgConnection,
        id: i64,
        quantity: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(tx)
        .await?;

        Ok(())
    }
}
