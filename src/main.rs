use anyhow::{Context, Result};
use clap::Parser;
use clinivoice::services::HttpCollaborators;
use clinivoice::{create_router, AppState, CaptureConfig, Config};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "clinivoice", about = "Voice dictation pipeline service")]
struct Args {
    /// Config file path (without extension)
    #[arg(long, default_value = "config/clinivoice")]
    config: String,

    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let port = args.port.unwrap_or(cfg.service.http.port);

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("transcription: {}", cfg.collaborators.transcription_url);
    info!("structuring:   {}", cfg.collaborators.structuring_url);

    let collaborators = Arc::new(HttpCollaborators::new(&cfg.collaborators)?);

    let capture_config = CaptureConfig {
        sample_rate: cfg.audio.sample_rate,
        channels: cfg.audio.channels,
        ..CaptureConfig::default()
    };

    let state = AppState::new(
        capture_config,
        collaborators.clone(),
        collaborators.clone(),
        collaborators.clone(),
        collaborators,
    );

    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, router)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
