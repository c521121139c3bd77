pub mod stats_controller;
pub mod wallet_controller;

use axum::routing::{get, Router};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use utils::AppConfig;

/// 服务首页
///
/// 返回运行状态与端点列表
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "服务运行正常")
    ),
    tag = "系统状态"
)]
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Wallet Registration API",
        "status": "running",
        "endpoints": {
            "register": "POST /register",
            "health": "GET /health",
            "stats": "GET /stats",
            "referral": "GET /referral/{referral_code}"
        }
    }))
}

pub fn app(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(wallet_controller::WalletController::app(config.enable_referrals))
        .merge(stats_controller::StatsController::app())
}
