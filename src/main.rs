use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ks_broker::{config::Config, services::SessionTokenService, web::WebServer};

#[derive(Parser)]
#[command(name = "ks-broker")]
#[command(version)]
#[command(about = "Session-token broker for embedded video playback")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("ks_broker={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting KS broker v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    if config.provider.api_endpoint.is_empty()
        || config.provider.partner_id <= 0
        || config.provider.admin_secret.is_empty()
    {
        warn!("provider account is not fully configured; token issuance will fail until it is");
    }

    let session_tokens = Arc::new(SessionTokenService::with_http(config.provider.clone()));
    let server = WebServer::new(config, session_tokens)?;
    info!("Listening on {}", server.addr());

    server.serve().await
}
