mod config;
mod error;
mod google;
mod importer;
mod mapper;
mod models;
mod server;
mod session;
mod sink;

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;
use crate::error::Result;
use crate::google::GoogleAuth;
use crate::server::AppState;
use crate::session::SessionStore;
use crate::sink::LoggingSink;

#[derive(Parser, Debug)]
#[command(name = "sheets-importer")]
#[command(about = "Import transactions from Google Sheets behind a session-backed OAuth2 flow", long_about = None)]
#[command(version)]
struct Cli {
    /// Override the listen port from the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let port = cli.port.unwrap_or(config.server.port);

    let state = AppState {
        auth: Arc::new(GoogleAuth::new(&config.google)?),
        sessions: SessionStore::new(),
        sink: Arc::new(LoggingSink),
    };

    let router = server::create_router(state, &config.server.cors_origin)?;

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, "Listening");

    axum::serve(listener, router).await?;

    Ok(())
}
