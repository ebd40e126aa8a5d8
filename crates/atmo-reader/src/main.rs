//! Reader binary: `atmo-reader <server-url>`
//!
//! Interactive loop: a station id filters the aggregate to one station, a
//! blank line fetches everything, `exit` quits. The reader advances its
//! Lamport clock before every request.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use atmo_proto::{get_records, ServerTarget};

#[tokio::main]
async fn main() -> Result<()> {
    atmo_obs::init("atmo-reader");

    let server_url = match std::env::args().nth(1) {
        Some(url) => url,
        None => {
            eprintln!("Usage: atmo-reader <server-url>");
            std::process::exit(1);
        }
    };
    let target = ServerTarget::parse(&server_url).context("invalid server url")?;

    let stdin = std::io::stdin();
    let mut clock: u64 = 0;

    loop {
        print!("\nEnter station id (blank for all, 'exit' to quit): ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") {
            println!("Closing reader...");
            break;
        }

        clock += 1;
        let station = (!input.is_empty()).then_some(input);

        match get_records(&target, clock, station).await {
            Ok(response) if response.status == 200 => match pretty(&response.body) {
                Some(text) => {
                    println!("===== Fetched weather data =====");
                    println!("{text}");
                }
                None => eprintln!("Unreadable response body"),
            },
            Ok(response) => eprintln!("Error response: {}", response.status),
            Err(e) => eprintln!("Error fetching weather data: {e}"),
        }
    }

    Ok(())
}

fn pretty(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    serde_json::to_string_pretty(&value).ok()
}
