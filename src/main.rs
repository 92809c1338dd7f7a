use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tsubame::config::Config;
use tsubame::engine::TransformEngine;
use tsubame::fetch::HttpImageSource;
use tsubame::server::{self, AppState};
use tsubame::watermark::WatermarkFont;

/// Tsubame - image transform service (format change, rotate, resize, watermark)
#[derive(Parser, Debug)]
#[command(name = "tsubame")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path).map_err(anyhow::Error::msg)?,
        None => Config::default(),
    };
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let config = load_config(args.config.as_ref()).context("Failed to load configuration")?;

    if args.test {
        println!("Configuration is valid");
        return Ok(());
    }

    // Initialize logging subsystem
    tsubame::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {e}"))?;

    tracing::info!(
        config_file = %args.config.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<defaults>".to_string()),
        server_address = %config.server.address,
        server_port = config.server.port,
        max_concurrent_transforms = config.server.max_concurrent_transforms,
        fetch_timeout_secs = config.fetch.timeout_secs,
        "Configuration loaded successfully"
    );

    // Resolve the watermark font once; a bad configured font is fatal
    let font = WatermarkFont::load(config.watermark.font_path.as_deref())
        .context("Failed to load watermark font")?;
    tracing::info!(font = font.origin(), "Watermark font loaded");

    let source =
        HttpImageSource::new(&config.fetch).context("Failed to build HTTP client for fetching")?;
    let engine = TransformEngine::new(Arc::new(font), &config.image);
    let state = AppState::new(engine, Arc::new(source), &config.server);

    let listener = server::bind(&config.server).await?;

    tracing::info!(
        address = %config.server.bind_address(),
        "Starting Tsubame image service"
    );

    server::serve(listener, state, shutdown_signal()).await;

    tracing::info!("Server stopped");
    Ok(())
}
