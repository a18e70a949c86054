mod bootstrap;
mod carts;
mod dispatcher;
mod health;
mod listener;
mod promotions;
mod protocol;
mod settlement;

use anyhow::Result;
use shoply_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use shoply_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
    )
    .await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let tcp = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        "shoply-server accepting connections"
    );

    let max_request_bytes = app.config.server.max_request_bytes;
    tokio::select! {
        result = listener::serve(tcp, app.dispatcher.clone(), max_request_bytes) => {
            result?;
        }
        result = tokio::signal::ctrl_c() => {
            result?;
        }
    }

    tracing::info!(event_name = "system.server.stopping", "shoply-server stopping");
    app.db_pool.close().await;

    Ok(())
}
