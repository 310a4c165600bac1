// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use idol_name_proxy::{
    api::start_server, bootstrap::shared_state, cli::Cli, config::ProxyConfig, version,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting {}", version::get_version_string());

    let config = ProxyConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::info!(
        "Quota: {} per {}s, {} per day",
        config.quota.short_window_limit,
        config.quota.short_window_seconds,
        config.quota.daily_limit
    );

    let state = shared_state(&config)
        .await
        .context("failed to initialize application state")?;

    start_server(state.clone(), cli.bind).await
}
