use crate::{
    dtos::stats_dto::ReferralInfoResponse,
    dtos::wallet_dto::{RegisterWalletDto, WalletResponse},
    extractors::validation_extractor::ValidationExtractor,
    services::Services,
};
use axum::{
    extract::Path,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use tracing::error;
use utils::{AppConfig, AppError, AppResult};

/// 注册钱包地址并返回推荐码
///
/// 业务失败(推荐码无效/自荐)返回200 + success=false；
/// 未兜住的内部错误也转成统一的失败响应，不抛HTTP错误码
#[utoipa::path(
    post,
    path = "/register",
    tag = "wallet",
    request_body = RegisterWalletDto,
    responses(
        (status = 200, description = "注册结果(含业务失败)", body = WalletResponse),
        (status = 422, description = "钱包地址长度不在20~100之间")
    )
)]
pub async fn register(
    Extension(services): Extension<Services>,
    Extension(config): Extension<Arc<AppConfig>>,
    ValidationExtractor(req): ValidationExtractor<RegisterWalletDto>,
) -> Json<WalletResponse> {
    // 推荐功能关闭时等价于无推荐版本：忽略请求里的referred_by
    let referred_by = if config.enable_referrals { req.referred_by } else { None };

    match services.wallet.register(req.wallet_address.clone(), referred_by).await {
        Ok(response) => Json(response),
        Err(err) => {
            error!("❌ Error registering wallet {}: {}", req.wallet_address, err);
            Json(WalletResponse::failure(req.wallet_address, "Internal server error"))
        }
    }
}

/// 查询某推荐码的详情
#[utoipa::path(
    get,
    path = "/referral/{referral_code}",
    tag = "wallet",
    params(
        ("referral_code" = String, Path, description = "推荐码")
    ),
    responses(
        (status = 200, description = "推荐码详情及名下注册列表", body = ReferralInfoResponse),
        (status = 404, description = "推荐码不存在")
    )
)]
pub async fn get_referral_info(
    Extension(services): Extension<Services>,
    Path(referral_code): Path<String>,
) -> AppResult<Json<ReferralInfoResponse>> {
    let info = services
        .wallet
        .get_referral_info(referral_code)
        .await
        .map_err(|err| match err {
            AppError::NotFound(message) => AppError::NotFound(message),
            err => {
                error!("❌ Error getting referral info: {}", err);
                AppError::InternalServerErrorWithContext("Failed to get referral information".to_string())
            }
        })?;

    Ok(Json(info))
}

pub struct WalletController;
impl WalletController {
    pub fn app(enable_referrals: bool) -> Router {
        let router = Router::new().route("/register", post(register));

        // 推荐码查询只在推荐功能开启时挂载
        if enable_referrals {
            router.route("/referral/:referral_code", get(get_referral_info))
        } else {
            router
        }
    }
}
