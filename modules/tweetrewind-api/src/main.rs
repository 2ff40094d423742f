use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tweetrewind_api::{router, AppState};
use tweetrewind_archive::{Archive, ArchiveConfig};
use tweetrewind_common::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let archive = Archive::connect(ArchiveConfig::from(&config))
        .context("Failed to build archive client")?;
    let app = router(Arc::new(AppState { archive }));

    let addr = format!("{}:{}", config.api_host, config.port);
    info!("TweetRewind API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
