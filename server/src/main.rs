use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use inbox_server::config::ServerConfig;
use inbox_server::engine::ticket_repository::TicketRepository;
use inbox_server::web::app_state::AppState;
use inbox_server::web::router::build_router;

/// Moderation ticket inbox over a JSON data file.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "inbox.toml")]
    config: PathBuf,

    /// Data file to serve (overrides config and DATA_FILE)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Address to listen on (overrides config and WEB_ADDRESS)
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(&cli.config)?;
    if let Some(data) = cli.data {
        config.data.file = data;
    }
    if let Some(address) = cli.address {
        config.server.web_address = address;
    }

    // A data file that doesn't load is fatal; there is no recovery path.
    let repository = TicketRepository::open(&config.data.file)
        .with_context(|| format!("failed to load tickets from {}", config.data.file.display()))?;

    let app_state = Arc::new(AppState {
        repository,
        default_page_size: config.tickets.default_page_size,
        cors_origin: config.server.cors_origin.clone(),
    });
    let app = build_router(app_state.clone());

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                signal_token.cancel();
            }
            Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
        }
    });

    let listener = tokio::net::TcpListener::bind(&config.server.web_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.web_address))?;

    info!(
        "Inbox server starting on {} (data: {})",
        config.server.web_address,
        app_state.repository.path().display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("server error")?;

    info!("Inbox server stopped");
    Ok(())
}
