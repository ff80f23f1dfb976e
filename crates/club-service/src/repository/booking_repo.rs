//! 课程与预约仓储
//!
//! 课程场次和预约记录耦合紧密（容量计数与预约行必须同步变动），
//! 集中在同一仓储中维护。

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{Booking, ClassSession, UpcomingBooking};

const CLASS_COLUMNS: &str = "id, title, coach, date, capacity, booked, created_at";
const BOOKING_COLUMNS: &str = "id, owner_id, class_id, created_at";

/// 课程与预约仓储
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 课程场次 ====================

    /// 按 ID 查询课程
    pub async fn get_class(&self, id: i64) -> Result<Option<ClassSession>> {
        let class = sqlx::query_as::<_, ClassSession>(&format!(
            "SELECT {CLASS_COLUMNS} FROM class_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(class)
    }

    /// 未来课程列表，按日期升序
    pub async fn list_upcoming_classes(&self) -> Result<Vec<ClassSession>> {
        let classes = sqlx::query_as::<_, ClassSession>(&format!(
            "SELECT {CLASS_COLUMNS} FROM class_sessions WHERE date >= now() ORDER BY date ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(classes)
    }

    /// 在事务中锁定并读取课程（FOR UPDATE）
    ///
    /// 容量检查与计数递增必须基于同一把行锁：两个并发预约
    /// 不能同时观察到 booked < capacity。
    pub async fn get_class_for_update(
        tx: &mut PgConnection,
        id: i64,
    ) -> Result<Option<ClassSession>> {
        let class = sqlx::query_as::<_, ClassSession>(&format!(
            "SELECT {CLASS_COLUMNS} FROM class_sessions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(class)
    }

    /// 在事务中调整已预约计数（delta 为 +1 或 -1）
    pub async fn adjust_booked_in_tx(tx: &mut PgConnection, class_id: i64, delta: i32) -> Result<()> {
        sqlx::query("UPDATE class_sessions SET booked = booked + $2 WHERE id = $1")
            .bind(class_id)
            .bind(delta)
            .execute(tx)
            .await?;

        Ok(())
    }

    // ==================== 预约 ====================

    /// 按 ID 查询预约
    pub async fn get_booking(&self, id: i64) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// 在事务中锁定并读取预约（FOR UPDATE）
    pub async fn get_booking_for_update(
        tx: &mut PgConnection,
        id: i64,
    ) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(booking)
    }

    /// 在事务中检查是否已存在 (owner, class) 预约
    pub async fn exists_in_tx(
        tx: &mut PgConnection,
        owner_id: &str,
        class_id: i64,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM bookings WHERE owner_id = $1 AND class_id = $2)",
        )
        .bind(owner_id)
        .bind(class_id)
        .fetch_one(tx)
        .await?;

        Ok(exists)
    }

    /// 在事务中创建预约
    pub async fn create_in_tx(
        tx: &mut PgConnection,
        owner_id: &str,
        class_id: i64,
    ) -> Result<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (owner_id, class_id)
            VALUES ($1, $2)
            RETURNING id, owner_id, class_id, created_at
            "#,
        )
        .bind(owner_id)
        .bind(class_id)
        .fetch_one(tx)
        .await?;

        Ok(booking)
    }

    /// 在事务中删除预约
    pub async fn delete_in_tx(tx: &mut PgConnection, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(tx)
            .await?;

        Ok(())
    }

    /// 用户的未来预约（课程日期严格在未来），按日期升序
    pub async fn list_upcoming_for_owner(&self, owner_id: &str) -> Result<Vec<UpcomingBooking>> {
        let bookings = sqlx::query_as::<_, UpcomingBooking>(
            r#"
            SELECT b.id, b.class_id, c.title, c.coach, c.date, b.created_at
            FROM bookings b
            JOIN class_sessions c ON c.id = b.class_id
            WHERE b.owner_id = $1 AND c.date > now()
            ORDER BY c.date ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }
}
