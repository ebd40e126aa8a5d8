//! Logging bootstrap shared by the atmo binaries

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging for a binary.
///
/// `RUST_LOG` wins when set. Otherwise the calling service's own crate
/// logs at debug and everything else at info, with the directive derived
/// from `service_name`. Output is JSON, one line per event.
pub fn init(service_name: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) => EnvFilter::new(spec),
        Err(_) => EnvFilter::new(default_directives(service_name)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!(service = %service_name, "logging initialized");
}

/// Build the default filter directives for a service binary. Tracing
/// targets use the crate name with underscores, so "atmo-server" debugs
/// `atmo_server` while the rest of the workspace stays at info.
fn default_directives(service_name: &str) -> String {
    let target = service_name.replace('-', "_");
    format!("info,{target}=debug")
}
