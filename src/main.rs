use anyhow::{Context, Result};
use clap::Parser;
use snapshop::{create_router, AppState, Config};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "snapshop", about = "Smart-glasses shopping assistant server")]
struct Args {
    /// Config file, with or without extension
    #[arg(short, long, default_value = "config/snapshop")]
    config: String,

    /// Override the HTTP port from the config file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("Loaded config: {}", cfg.service.name);
    info!(
        "Capture loop: tick every {}ms, {}s cooldown",
        cfg.capture.tick_interval_ms, cfg.capture.cooldown_secs
    );
    info!("Glasses bridge: {}", cfg.glasses.bridge_url);

    let (state, _analysis_worker) = AppState::from_config(&cfg)?;
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
