use async_trait::async_trait;
use axum::http::StatusCode;
use axum::{Extension, Router};
use axum_test::TestServer;
use database::wallet::model::Wallet;
use database::wallet::repository::{WalletRepositoryTrait, REFERRAL_CODE_INDEX, WALLET_ADDRESS_INDEX};
use mongodb::bson::{oid::ObjectId, Bson};
use serde_json::{json, Value};
use server::api;
use server::services::wallet::wallet_service::{DynWalletService, WalletService};
use server::services::Services;
use std::sync::{Arc, Mutex};
use utils::{AppConfig, AppError, AppResult};

/// 内存仓库，插入时复刻唯一索引的冲突行为
#[derive(Default)]
struct InMemoryWalletRepository {
    wallets: Mutex<Vec<Wallet>>,
}

#[async_trait]
impl WalletRepositoryTrait for InMemoryWalletRepository {
    async fn find_by_address(&self, wallet_address: &str) -> AppResult<Option<Wallet>> {
        Ok(self
            .wallets
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.wallet_address == wallet_address)
            .cloned())
    }

    async fn find_by_referral_code(&self, referral_code: &str) -> AppResult<Option<Wallet>> {
        Ok(self
            .wallets
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.referral_code == referral_code)
            .cloned())
    }

    async fn insert_wallet(&self, wallet: Wallet) -> AppResult<Bson> {
        let mut wallets = self.wallets.lock().unwrap();

        if wallets.iter().any(|w| w.wallet_address == wallet.wallet_address) {
            return Err(AppError::Conflict(format!("E11000 index: {}", WALLET_ADDRESS_INDEX)));
        }
        if wallets.iter().any(|w| w.referral_code == wallet.referral_code) {
            return Err(AppError::Conflict(format!("E11000 index: {}", REFERRAL_CODE_INDEX)));
        }

        let id = ObjectId::new();
        let mut wallet = wallet;
        wallet.id = Some(id);
        wallets.push(wallet);

        Ok(Bson::ObjectId(id))
    }

    async fn increment_referral_count(&self, referral_code: &str) -> AppResult<u64> {
        let mut wallets = self.wallets.lock().unwrap();

        match wallets.iter_mut().find(|w| w.referral_code == referral_code) {
            Some(wallet) => {
                wallet.referral_count += 1;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count_wallets(&self) -> AppResult<u64> {
        Ok(self.wallets.lock().unwrap().len() as u64)
    }

    async fn count_registered_since(&self, since: u64) -> AppResult<u64> {
        Ok(self
            .wallets
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.created_at >= since)
            .count() as u64)
    }

    async fn count_referred(&self) -> AppResult<u64> {
        Ok(self
            .wallets
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.referred_by.is_some())
            .count() as u64)
    }

    async fn top_referrers(&self, limit: i64) -> AppResult<Vec<Wallet>> {
        let mut wallets: Vec<Wallet> = self
            .wallets
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.referral_count > 0)
            .cloned()
            .collect();
        wallets.sort_by(|a, b| b.referral_count.cmp(&a.referral_count));
        wallets.truncate(limit as usize);

        Ok(wallets)
    }

    async fn find_referred_by(&self, referral_code: &str, limit: i64) -> AppResult<Vec<Wallet>> {
        let mut wallets: Vec<Wallet> = self
            .wallets
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.referred_by.as_deref() == Some(referral_code))
            .cloned()
            .collect();
        wallets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        wallets.truncate(limit as usize);

        Ok(wallets)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

fn test_router(enable_referrals: bool) -> Router {
    let mut config = AppConfig::new_for_test();
    config.enable_referrals = enable_referrals;
    let config = Arc::new(config);

    let repository = Arc::new(InMemoryWalletRepository::default());
    let wallet = Arc::new(WalletService::new(repository)) as DynWalletService;
    let services = Services { wallet };

    api::app(config.clone())
        .layer(Extension(services))
        .layer(Extension(config))
}

fn test_server(enable_referrals: bool) -> TestServer {
    TestServer::new(test_router(enable_referrals)).expect("Failed to start test server")
}

const ADDRESS_A: &str = "0xAAAAAAAAAAAAAAAAAAAA"; // 22位
const ADDRESS_B: &str = "0xBBBBBBBBBBBBBBBBBBBB";
const ADDRESS_C: &str = "0xCCCCCCCCCCCCCCCCCCCC";

async fn register(server: &TestServer, wallet_address: &str, referred_by: Option<&str>) -> Value {
    let mut body = json!({ "wallet_address": wallet_address });
    if let Some(code) = referred_by {
        body["referred_by"] = json!(code);
    }

    let response = server.post("/register").json(&body).await;
    response.assert_status_ok();
    response.json::<Value>()
}

#[tokio::test]
async fn test_root_banner_lists_endpoints() {
    let server = test_server(true);

    let response = server.get("/").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["message"], "Wallet Registration API");
    assert_eq!(body["status"], "running");
    assert_eq!(body["endpoints"]["register"], "POST /register");
}

#[tokio::test]
async fn test_register_and_reregister_same_code() {
    let server = test_server(true);

    let first = register(&server, ADDRESS_A, None).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["message"], "Wallet registered successfully");

    let code = first["referral_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    let second = register(&server, ADDRESS_A, None).await;
    assert_eq!(second["success"], true);
    assert_eq!(second["message"], "Wallet already registered");
    assert_eq!(second["referral_code"].as_str().unwrap(), code);
}

#[tokio::test]
async fn test_referral_flow_end_to_end() {
    let server = test_server(true);

    let first = register(&server, ADDRESS_A, None).await;
    let code = first["referral_code"].as_str().unwrap().to_string();

    let second = register(&server, ADDRESS_B, Some(&code)).await;
    assert_eq!(second["success"], true);
    assert_eq!(second["referred_by"].as_str().unwrap(), code);

    // 无效推荐码：不建档，success=false
    let third = register(&server, ADDRESS_C, Some("NOPE00")).await;
    assert_eq!(third["success"], false);
    assert_eq!(third["message"], "Invalid referral code");
    assert_eq!(third["referral_code"], "");

    let stats = server.get("/stats").await;
    stats.assert_status_ok();
    let stats = stats.json::<Value>();
    assert_eq!(stats["total_registered_wallets"], 2);
    assert_eq!(stats["wallets_with_referral"], 1);
    assert_eq!(stats["referral_percentage"], 50.0);
    assert_eq!(stats["top_referrers"][0]["referral_count"], 1);

    let info = server.get(&format!("/referral/{}", code)).await;
    info.assert_status_ok();
    let info = info.json::<Value>();
    assert_eq!(info["wallet_address"], ADDRESS_A);
    assert_eq!(info["referral_count"], 1);
    assert_eq!(info["referred_users"][0]["wallet_address"], ADDRESS_B);
}

#[tokio::test]
async fn test_register_rejects_short_address_before_handler() {
    let server = test_server(true);

    let response = server
        .post("/register")
        .json(&json!({ "wallet_address": "tooshort" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_health_reports_connected() {
    let server = test_server(true);
    register(&server, ADDRESS_A, None).await;

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["registered_wallets"], 1);
}

#[tokio::test]
async fn test_stats_on_empty_store_has_zero_percentage() {
    let server = test_server(true);

    let response = server.get("/stats").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["total_registered_wallets"], 0);
    assert_eq!(body["referral_percentage"], 0.0);
}

#[tokio::test]
async fn test_unknown_referral_code_is_404() {
    let server = test_server(true);

    let response = server.get("/referral/NOPE00").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_referrals_disabled_variant() {
    let server = test_server(false);

    // referred_by被忽略，注册仍然成功
    let first = register(&server, ADDRESS_A, None).await;
    let code = first["referral_code"].as_str().unwrap().to_string();

    let second = register(&server, ADDRESS_B, Some(&code)).await;
    assert_eq!(second["success"], true);
    assert!(second["referred_by"].is_null());

    // 推荐码查询端点不挂载
    let response = server.get(&format!("/referral/{}", code)).await;
    response.assert_status_not_found();

    let stats = server.get("/stats").await.json::<Value>();
    assert_eq!(stats["wallets_with_referral"], 0);
}
