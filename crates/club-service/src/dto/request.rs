//! 请求 DTO 定义

use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

/// 钱包充值请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreditWalletRequest {
    /// 充值金额，必须大于 0（由服务层校验并返回 INVALID_AMOUNT）
    pub amount: Decimal,
    /// 流水描述，缺省为 "Account top-up"
    #[validate(length(min = 1, max = 200))]
    pub description: Option<String>,
}

/// 创建订单请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(range(min = 1))]
    pub product_id: i64,
}

/// 列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: Option<i64>,
}
