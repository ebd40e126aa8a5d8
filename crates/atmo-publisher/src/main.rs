//! Publisher binary: `atmo-publisher <server-url> <data-file>`
//!
//! Reads one observation file, stamps the publisher's clock, and issues a
//! single PUT.

use anyhow::{Context, Result};
use tracing::error;

use atmo_proto::{put_record, ServerTarget};
use atmo_publisher::parse_observation;

#[tokio::main]
async fn main() -> Result<()> {
    atmo_obs::init("atmo-publisher");

    let mut args = std::env::args().skip(1);
    let (server_url, data_file) = match (args.next(), args.next()) {
        (Some(url), Some(file)) => (url, file),
        _ => {
            eprintln!("Usage: atmo-publisher <server-url> <data-file>");
            std::process::exit(1);
        }
    };

    let target = ServerTarget::parse(&server_url).context("invalid server url")?;

    let content = std::fs::read_to_string(&data_file)
        .with_context(|| format!("failed to read weather data from {data_file}"))?;
    let record = parse_observation(&content).context("invalid weather data file")?;

    // First increment of this publisher's local clock.
    let clock = 1;
    let body = atmo_core::codec::encode_record(&record).context("failed to encode record")?;

    let response = put_record(&target, clock, &body)
        .await
        .context("error sending update")?;

    println!(
        "Update sent for {} (clock={}) - status {}",
        record.id, clock, response.status
    );
    if response.status == 400 {
        error!(station = %record.id, "out-of-order request rejected");
    }

    Ok(())
}
