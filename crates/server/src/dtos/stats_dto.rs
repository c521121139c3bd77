use database::wallet::model::Wallet;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 健康检查响应，连不上数据库也返回200，仅状态字段不同
#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_wallets: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

/// 注册统计
#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct StatsResponse {
    pub total_registered_wallets: u64,
    /// 当日(UTC零点起)新增注册数
    pub registrations_today: u64,
    pub wallets_with_referral: u64,
    /// 被推荐注册的占比，保留2位小数，空库为0
    pub referral_percentage: f64,
    pub top_referrers: Vec<TopReferrer>,
    pub timestamp: i64,
}

#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct TopReferrer {
    pub wallet_address: String,
    pub referral_code: String,
    pub referral_count: u64,
}

impl From<Wallet> for TopReferrer {
    fn from(wallet: Wallet) -> Self {
        Self {
            wallet_address: wallet.wallet_address,
            referral_code: wallet.referral_code,
            referral_count: wallet.referral_count,
        }
    }
}

/// 某推荐码的详情：码主信息 + 名下注册列表
#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct ReferralInfoResponse {
    pub referral_code: String,
    pub wallet_address: String,
    pub referral_count: u64,
    pub created_at: u64,
    pub referred_users: Vec<ReferredUser>,
}

#[derive(Clone, Serialize, Deserialize, Debug, ToSchema)]
pub struct ReferredUser {
    pub wallet_address: String,
    pub created_at: u64,
}

impl From<Wallet> for ReferredUser {
    fn from(wallet: Wallet) -> Self {
        Self {
            wallet_address: wallet.wallet_address,
            created_at: wallet.created_at,
        }
    }
}
