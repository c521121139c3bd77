use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// 钱包注册模型
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct Wallet {
    /// MongoDB文档ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// 钱包地址
    #[validate(length(min = 20, max = 100))]
    pub wallet_address: String, // Address
    /// 注册时分配的推荐码，全局唯一且不可变
    pub referral_code: String,
    /// 注册时填写的推荐码(无则为null)
    pub referred_by: Option<String>,
    /// 推荐人钱包地址快照，写入后不再变化
    pub referred_by_wallet: Option<String>,
    /// 成功推荐的人数
    #[serde(default)]
    pub referral_count: u64,
    /// 注册时间戳
    #[serde(with = "mongodb::bson::serde_helpers::u64_as_f64")]
    pub created_at: u64, // 1734187238
}
