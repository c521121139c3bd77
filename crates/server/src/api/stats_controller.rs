use crate::{
    dtos::stats_dto::{HealthResponse, StatsResponse},
    services::Services,
};
use axum::{routing::get, Extension, Json, Router};
use tracing::error;
use utils::{AppError, AppResult};

/// 健康检查：数据库连通性 + 注册总数
#[utoipa::path(
    get,
    path = "/health",
    tag = "stats",
    responses(
        (status = 200, description = "健康状态(连不上数据库也返回200)", body = HealthResponse)
    )
)]
pub async fn health(Extension(services): Extension<Services>) -> Json<HealthResponse> {
    Json(services.wallet.health().await)
}

/// 注册统计
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "注册与推荐的聚合统计", body = StatsResponse),
        (status = 500, description = "统计查询失败")
    )
)]
pub async fn stats(Extension(services): Extension<Services>) -> AppResult<Json<StatsResponse>> {
    let stats = services.wallet.get_stats().await.map_err(|err| {
        error!("❌ Error getting stats: {}", err);
        AppError::InternalServerErrorWithContext("Failed to get statistics".to_string())
    })?;

    Ok(Json(stats))
}

pub struct StatsController;
impl StatsController {
    pub fn app() -> Router {
        Router::new().route("/health", get(health)).route("/stats", get(stats))
    }
}
