//! Sage - 研究助理服务入口
//!
//! 初始化日志、加载配置、构建组件（凭据问题在此直接失败）并启动 HTTP API。

use std::sync::Arc;

use anyhow::Context;
use sage::api::{router, AppState};
use sage::config::{load_config, AppConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let state = Arc::new(
        AppState::from_config(&cfg).context("Failed to create application components")?,
    );
    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.web.port));
    tracing::info!("Sage research API: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
