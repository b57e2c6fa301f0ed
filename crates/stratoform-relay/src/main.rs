use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use stratoform_relay::{RelayConfig, router, serve};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RelayConfig::parse();
    tracing::info!(
        project = %config.project_id,
        topic = %config.topic_id,
        emulator = config.emulator_host.is_some(),
        "Starting relay"
    );

    let publisher = Arc::new(config.publisher());
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    serve(listener, router(publisher)).await?;
    Ok(())
}
