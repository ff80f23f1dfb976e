//! 课程与预约模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 课程场次
///
/// 容量不变式：booked 永远不超过 capacity。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClassSession {
    pub id: i64,
    pub title: String,
    pub coach: String,
    pub date: DateTime<Utc>,
    pub capacity: i32,
    pub booked: i32,
    pub created_at: DateTime<Utc>,
}

/// 课程预约
///
/// 同一 (owner, class) 至多一条。删除必须与 booked 计数回减
/// 处于同一原子步骤。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub owner_id: String,
    pub class_id: i64,
    pub created_at: DateTime<Utc>,
}

/// 带课程信息的预约视图（用于"我的预约"列表）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingBooking {
    pub id: i64,
    pub class_id: i64,
    pub title: String,
    pub coach: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
