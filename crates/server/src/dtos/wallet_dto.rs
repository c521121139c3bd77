use database::wallet::model::Wallet;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// 注册钱包的请求体
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Default, ToSchema)]
pub struct RegisterWalletDto {
    /// 钱包地址
    #[validate(length(min = 20, max = 100))]
    pub wallet_address: String,
    /// 邀请人的推荐码
    pub referred_by: Option<String>,
}

/// 注册结果，业务失败也走该结构(HTTP 200 + success=false)
#[derive(Clone, Serialize, Deserialize, Debug, Default, ToSchema)]
pub struct WalletResponse {
    pub success: bool,
    pub message: String,
    pub referral_code: String,
    pub wallet_address: String,
    pub referred_by: Option<String>,
}

impl WalletResponse {
    pub fn registered(wallet_address: String, referral_code: String, referred_by: Option<String>) -> Self {
        Self {
            success: true,
            message: "Wallet registered successfully".to_string(),
            referral_code,
            wallet_address,
            referred_by,
        }
    }

    pub fn already_registered(existing: &Wallet) -> Self {
        Self {
            success: true,
            message: "Wallet already registered".to_string(),
            referral_code: existing.referral_code.clone(),
            wallet_address: existing.wallet_address.clone(),
            referred_by: existing.referred_by.clone(),
        }
    }

    pub fn failure(wallet_address: String, message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            referral_code: String::new(),
            wallet_address,
            referred_by: None,
        }
    }
}
