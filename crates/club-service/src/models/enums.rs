//! 枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 账本条目类型
///
/// 钱包余额的每一次变动都对应一条账本条目，金额恒为正，
/// 方向由类型决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum LedgerKind {
    /// 入账 - 充值等增加余额的操作
    Credit,
    /// 出账 - 消费等减少余额的操作
    Debit,
}

/// 订单状态
///
/// 订单流水线的状态机：Pending 为唯一非终态，
/// Completed 和 Error 均为终态，进入后不再迁移。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum OrderStatus {
    /// 待结算 - 已创建，等待员工确认和对账结算
    #[default]
    Pending,
    /// 已完成 - 结算成功（终态）
    Completed,
    /// 结算失败 - 结算时前置条件不满足（终态，不自动重试）
    Error,
}

impl OrderStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl LedgerKind {
    /// 对余额的符号影响：Credit 为 +1，Debit 为 -1
    pub fn sign(&self) -> i64 {
        match self {
            Self::Credit => 1,
            Self::Debit => -1,
        }
    }
}
