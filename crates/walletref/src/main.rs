use anyhow::{Context, Result};
use clap::Parser;
use server::app::ApplicationServer;
use std::sync::Arc;
use utils::{AppConfig, Logger};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // 根据 CARGO_ENV 加载对应的环境配置文件
    utils::EnvLoader::load_env_file().ok();

    let config = Arc::new(AppConfig::parse());

    // 日志guard需要活到进程结束，否则缓冲的日志会丢
    let _guard = Logger::new(config.cargo_env);

    ApplicationServer::serve(config).await.context("🔴 Failed to start server")?;

    Ok(())
}
