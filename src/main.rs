use anyhow::Context;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use shopadmin::{AppState, ClientConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "shopadmin=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("loading configuration")?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(path) = &cli.session_file {
        config.session_file = path.clone();
    }
    tracing::debug!(base_url = %config.base_url, "configured");

    let state = AppState::init(config).await.context("initialising client")?;
    commands::run(&state, cli.command, cli.json).await
}
