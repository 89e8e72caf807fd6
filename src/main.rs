//! gluebot CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gluebot")]
#[command(about = "Chat bot that captions images and videos on command")]
struct Cli {
    /// Path to config file (optional)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    let config = match &cli.config {
        Some(config_path) => gluebot::config::Config::load_from_path(config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?,
        None => gluebot::config::Config::load()
            .with_context(|| "failed to load configuration from environment")?,
    };

    // Held until exit so the file writer flushes.
    let _log_guard = gluebot::logging::init_tracing(cli.debug, config.log_dir.as_deref());

    tracing::info!(
        base_url = %config.base_url,
        user = %config.username,
        prefix = %config.prefix,
        "starting gluebot"
    );

    tokio::select! {
        result = gluebot::supervisor::run(Arc::new(config)) => {
            result.context("bot stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("gluebot stopped");
    Ok(())
}
