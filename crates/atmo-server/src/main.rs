//! Aggregation server binary
//!
//! Accepts station observations from publishers and serves the current
//! aggregate to readers. One optional positional argument overrides the
//! configured listen port.

use anyhow::{Context, Result};
use tracing::{error, info};

use atmo_server::{Aggregator, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    atmo_obs::init("atmo-server");

    let cfg = atmo_config::AppConfig::load().context("Failed to load configuration")?;
    let mut settings = Settings::from_config(&cfg);

    if let Some(arg) = std::env::args().nth(1) {
        match arg.parse() {
            Ok(port) => settings.port = port,
            Err(_) => error!(port = settings.port, "invalid port argument, using configured port"),
        }
    }

    let server = Aggregator::bind(settings)
        .await
        .context("Failed to bind listener")?;
    info!(addr = %server.local_addr(), "aggregation server listening");

    let handle = server.spawn();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to install signal handler")?;
    info!("shutdown signal received");

    handle.shutdown().await;
    Ok(())
}
