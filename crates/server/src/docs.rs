use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wallet Registration API",
        description = "基于 Rust 和 Axum 的钱包注册与推荐码服务 API 文档",
        version = "1.0.0"
    ),
    paths(
        // System status
        crate::api::root,
        // Wallet endpoints
        crate::api::wallet_controller::register,
        crate::api::wallet_controller::get_referral_info,
        // Stats endpoints
        crate::api::stats_controller::health,
        crate::api::stats_controller::stats,
    ),
    components(
        schemas(
            crate::dtos::wallet_dto::RegisterWalletDto,
            crate::dtos::wallet_dto::WalletResponse,
            crate::dtos::stats_dto::HealthResponse,
            crate::dtos::stats_dto::StatsResponse,
            crate::dtos::stats_dto::TopReferrer,
            crate::dtos::stats_dto::ReferralInfoResponse,
            crate::dtos::stats_dto::ReferredUser,
        )
    ),
    tags(
        (name = "wallet", description = "钱包注册与推荐码"),
        (name = "stats", description = "健康检查与统计"),
        (name = "系统状态", description = "服务状态")
    )
)]
pub struct ApiDoc;
