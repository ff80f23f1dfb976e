//! 课程预约服务
//!
//! 维护课程容量不变式：booked 永远不超过 capacity，
//! 同一用户对同一课程至多一条预约。

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, instrument};

use crate::error::{CommerceError, Result};
use crate::models::{Booking, ClassSession, UpcomingBooking};
use crate::repository::BookingRepository;

/// 课程预约服务
pub struct BookingService {
    booking_repo: Arc<BookingRepository>,
    pool: PgPool,
}

impl BookingService {
    pub fn new(booking_repo: Arc<BookingRepository>, pool: PgPool) -> Self {
        Self { booking_repo, pool }
    }

    /// 未来课程列表，按日期升序
    pub async fn list_classes(&self) -> Result<Vec<ClassSession>> {
        self.booking_repo.list_upcoming_classes().await
    }

    /// 预约课程
    ///
    /// 事务内：锁定课程行 -> 容量检查 -> 去重检查 -> 创建预约 + booked 递增，
    /// 四步要么全部生效要么全部回滚。两个并发预约串行通过课程行锁，
    /// 不可能同时观察到 booked < capacity 而双双成功。
    #[instrument(skip(self), fields(owner_id = %owner_id, class_id = class_id))]
    pub async fn reserve(&self, owner_id: &str, class_id: i64) -> Result<Booking> {
        let mut tx = self.pool.begin().await?;

        let class = BookingRepository::get_class_for_update(&mut tx, class_id)
            .await?
            .ok_or(CommerceError::ClassNotFound(class_id))?;

        if class.booked >= class.capacity {
            return Err(CommerceError::ClassFull(class_id));
        }

        if BookingRepository::exists_in_tx(&mut tx, owner_id, class_id).await? {
            return Err(CommerceError::AlreadyBooked {
                owner_id: owner_id.to_string(),
                class_id,
            });
        }

        let booking = BookingRepository::create_in_tx(&mut tx, owner_id, class_id).await?;
        BookingRepository::adjust_booked_in_tx(&mut tx, class_id, 1).await?;

        tx.commit().await?;

        info!(
            owner_id = %owner_id,
            class_id = class_id,
            booking_id = booking.id,
            booked = class.booked + 1,
            capacity = class.capacity,
            "课程预约成功"
        );

        Ok(booking)
    }

    /// 取消预约
    ///
    /// 仅预约人本人可取消。事务内：锁定预约 -> 归属检查 ->
    /// 删除预约 + booked 回减。
    #[instrument(skip(self), fields(booking_id = booking_id, requester_id = %requester_id))]
    pub async fn release(&self, booking_id: i64, requester_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let booking = BookingRepository::get_booking_for_update(&mut tx, booking_id)
            .await?
            .ok_or(CommerceError::BookingNotFound(booking_id))?;

        if booking.owner_id != requester_id {
            return Err(CommerceError::Forbidden(booking_id));
        }

        BookingRepository::delete_in_tx(&mut tx, booking_id).await?;
        BookingRepository::adjust_booked_in_tx(&mut tx, booking.class_id, -1).await?;

        tx.commit().await?;

        info!(
            booking_id = booking_id,
            class_id = booking.class_id,
            owner_id = %booking.owner_id,
            "预约已取消"
        );

        Ok(())
    }

    /// 用户的未来预约（课程日期严格在未来），按日期升序
    pub async fn upcoming_for(&self, owner_id: &str) -> Result<Vec<UpcomingBooking>> {
        self.booking_repo.list_upcoming_for_owner(owner_id).await
    }
}
