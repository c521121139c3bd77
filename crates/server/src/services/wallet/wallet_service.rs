use crate::dtos::stats_dto::{HealthResponse, ReferralInfoResponse, StatsResponse, TopReferrer};
use crate::dtos::wallet_dto::WalletResponse;
use crate::services::wallet::referral_code;
use async_trait::async_trait;
use chrono::Utc;
use database::wallet::model::Wallet;
use database::wallet::repository::{DynWalletRepository, WALLET_ADDRESS_INDEX};
use mongodb::bson::Bson;
use std::sync::Arc;
use tracing::{error, info, warn};
use utils::{AppError, AppResult};

/// 推荐码碰撞重试上限，超过后改用兜底码
const MAX_ALLOCATION_ATTEMPTS: u32 = 10;

/// 插入撞推荐码唯一索引后的重新分配次数上限
const INSERT_RETRY_LIMIT: u32 = 3;

pub type DynWalletService = Arc<dyn WalletServiceTrait + Send + Sync>;

#[async_trait]
pub trait WalletServiceTrait {
    /// 注册钱包地址并返回推荐码，重复注册幂等
    async fn register(&self, wallet_address: String, referred_by: Option<String>) -> AppResult<WalletResponse>;

    async fn health(&self) -> HealthResponse;

    async fn get_stats(&self) -> AppResult<StatsResponse>;

    async fn get_referral_info(&self, referral_code: String) -> AppResult<ReferralInfoResponse>;
}

#[derive(Clone)]
pub struct WalletService {
    repository: DynWalletRepository,
}

impl WalletService {
    pub fn new(repository: DynWalletRepository) -> Self {
        Self { repository }
    }

    /// 分配一个当前未被占用的推荐码
    ///
    /// 6位起步，碰撞1~4次升到7位，第5次起8位；超过10次放弃该方案，
    /// 返回兜底码并记error
    pub(crate) async fn allocate_referral_code(&self) -> AppResult<String> {
        let mut candidate = referral_code::generate(referral_code::DEFAULT_CODE_LENGTH);
        let mut attempts = 0u32;

        loop {
            if self.repository.find_by_referral_code(&candidate).await?.is_none() {
                return Ok(candidate);
            }

            attempts += 1;
            if attempts > MAX_ALLOCATION_ATTEMPTS {
                error!("❌ Could not generate unique referral code after {} attempts.", attempts);
                return Ok(referral_code::fallback());
            }

            candidate = referral_code::generate(if attempts < 5 { 7 } else { 8 });
        }
    }

    /// 解析注册请求中的推荐码，返回推荐人记录
    ///
    /// 推荐码不存在或自荐时返回Err(WalletResponse)直接作为业务失败响应
    async fn resolve_referrer(
        &self,
        wallet_address: &str,
        referred_by: &Option<String>,
    ) -> AppResult<Result<Option<Wallet>, WalletResponse>> {
        let code = match referred_by {
            Some(code) => code,
            None => return Ok(Ok(None)),
        };

        let referrer = match self.repository.find_by_referral_code(code).await? {
            Some(referrer) => referrer,
            None => {
                warn!("⚠️ Invalid referral code: {}", code);
                return Ok(Err(WalletResponse::failure(
                    wallet_address.to_string(),
                    "Invalid referral code",
                )));
            }
        };

        if referrer.wallet_address == wallet_address {
            warn!("⚠️ Self-referral attempt: {}", wallet_address);
            return Ok(Err(WalletResponse::failure(
                wallet_address.to_string(),
                "Cannot refer yourself",
            )));
        }

        Ok(Ok(Some(referrer)))
    }

    /// 新记录落库后的副作用：推荐人计数+1
    ///
    /// 尽力而为，失败只记日志不回滚新记录
    async fn bump_referrer_count(&self, referrer: &Wallet) {
        match self.repository.increment_referral_count(&referrer.referral_code).await {
            Ok(_) => info!("Updated referral count for: {}", referrer.wallet_address),
            Err(err) => error!(
                "❌ Failed to update referral count for {}: {}",
                referrer.wallet_address, err
            ),
        }
    }
}

#[async_trait]
impl WalletServiceTrait for WalletService {
    async fn register(&self, wallet_address: String, referred_by: Option<String>) -> AppResult<WalletResponse> {
        // 1. 已注册过则原样返回，注册幂等
        if let Some(existing) = self.repository.find_by_address(&wallet_address).await? {
            info!("Wallet already exists: {}", wallet_address);
            return Ok(WalletResponse::already_registered(&existing));
        }

        // 2. 校验推荐码(不存在/自荐直接返回业务失败)
        let referrer = match self.resolve_referrer(&wallet_address, &referred_by).await? {
            Ok(referrer) => referrer,
            Err(failure) => return Ok(failure),
        };

        // 3. 分配推荐码并落库。插入撞唯一索引时:
        //    - 地址冲突 => 并发下输给了同地址的注册，按已注册处理
        //    - 推荐码冲突 => 重新分配后重试
        for _ in 0..INSERT_RETRY_LIMIT {
            let referral_code = self.allocate_referral_code().await?;

            let wallet = Wallet {
                id: None,
                wallet_address: wallet_address.clone(),
                referral_code: referral_code.clone(),
                referred_by: referred_by.clone(),
                referred_by_wallet: referrer.as_ref().map(|r| r.wallet_address.clone()),
                referral_count: 0,
                created_at: Utc::now().timestamp() as u64,
            };

            match self.repository.insert_wallet(wallet).await {
                Ok(inserted_id) => {
                    if inserted_id == Bson::Null {
                        error!("❌ Failed to insert wallet: {}", wallet_address);
                        return Ok(WalletResponse::failure(wallet_address, "Failed to register wallet"));
                    }

                    if let Some(referrer) = &referrer {
                        self.bump_referrer_count(referrer).await;
                    }

                    info!(
                        "New wallet registered: {} -> {}{}",
                        wallet_address,
                        referral_code,
                        referred_by
                            .as_deref()
                            .map(|code| format!(" (referred by {})", code))
                            .unwrap_or_default()
                    );

                    return Ok(WalletResponse::registered(wallet_address, referral_code, referred_by));
                }
                Err(AppError::Conflict(message)) => {
                    if message.contains(WALLET_ADDRESS_INDEX) {
                        // 地址唯一索引拦下了并发注册
                        match self.repository.find_by_address(&wallet_address).await? {
                            Some(existing) => {
                                info!("Wallet already exists (lost insert race): {}", wallet_address);
                                return Ok(WalletResponse::already_registered(&existing));
                            }
                            None => {
                                return Ok(WalletResponse::failure(wallet_address, "Failed to register wallet"));
                            }
                        }
                    }

                    warn!("⚠️ Referral code collision on insert, re-allocating: {}", message);
                }
                Err(err) => return Err(err),
            }
        }

        error!("❌ Failed to insert wallet after {} attempts: {}", INSERT_RETRY_LIMIT, wallet_address);
        Ok(WalletResponse::failure(wallet_address, "Failed to register wallet"))
    }

    async fn health(&self) -> HealthResponse {
        let checked = async {
            self.repository.ping().await?;
            self.repository.count_wallets().await
        };

        match checked.await {
            Ok(wallet_count) => HealthResponse {
                status: "healthy".to_string(),
                database: "connected".to_string(),
                registered_wallets: Some(wallet_count),
                error: None,
                timestamp: Utc::now().timestamp(),
            },
            Err(err) => {
                error!("❌ Health check failed: {}", err);
                HealthResponse {
                    status: "unhealthy".to_string(),
                    database: "disconnected".to_string(),
                    registered_wallets: None,
                    error: Some(err.to_string()),
                    timestamp: Utc::now().timestamp(),
                }
            }
        }
    }

    async fn get_stats(&self) -> AppResult<StatsResponse> {
        let total_wallets = self.repository.count_wallets().await?;

        // 当日注册数(UTC零点为界)
        let today_start = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp() as u64;
        let registrations_today = self.repository.count_registered_since(today_start).await?;

        let referred_count = self.repository.count_referred().await?;

        let referral_percentage = if total_wallets > 0 {
            (referred_count as f64 / total_wallets as f64 * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };

        let top_referrers = self
            .repository
            .top_referrers(5)
            .await?
            .into_iter()
            .map(TopReferrer::from)
            .collect();

        Ok(StatsResponse {
            total_registered_wallets: total_wallets,
            registrations_today,
            wallets_with_referral: referred_count,
            referral_percentage,
            top_referrers,
            timestamp: Utc::now().timestamp(),
        })
    }

    async fn get_referral_info(&self, referral_code: String) -> AppResult<ReferralInfoResponse> {
        let wallet = self
            .repository
            .find_by_referral_code(&referral_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Referral code not found".to_string()))?;

        let referred_users = self
            .repository
            .find_referred_by(&referral_code, 100)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(ReferralInfoResponse {
            referral_code,
            wallet_address: wallet.wallet_address,
            referral_count: wallet.referral_count,
            created_at: wallet.created_at,
            referred_users,
        })
    }
}
