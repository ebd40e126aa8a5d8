//! Client-side framing for the publisher and reader binaries

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::{read_response, HttpResponse, ProtoError, ProtoResult};

/// Default aggregator port.
pub const DEFAULT_PORT: u16 = 4567;

/// A resolved aggregator endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub host: String,
    pub port: u16,
}

impl ServerTarget {
    /// Parse the user-supplied server URL. Accepts `host`, `host:port`, and
    /// `http://host[:port]`; the port defaults to 4567.
    pub fn parse(url: &str) -> ProtoResult<Self> {
        let trimmed = url.trim();
        let without_scheme = trimmed
            .strip_prefix("http://")
            .unwrap_or(trimmed)
            .trim_end_matches('/');

        if without_scheme.is_empty() {
            return Err(ProtoError::InvalidUrl(url.to_string()));
        }

        match without_scheme.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| ProtoError::InvalidUrl(url.to_string()))?;
                if host.is_empty() {
                    return Err(ProtoError::InvalidUrl(url.to_string()));
                }
                Ok(Self {
                    host: host.to_string(),
                    port,
                })
            }
            None => Ok(Self {
                host: without_scheme.to_string(),
                port: DEFAULT_PORT,
            }),
        }
    }
}

/// Issue one `PUT /weather.json` carrying `body` and the given clock.
pub async fn put_record(
    target: &ServerTarget,
    clock: u64,
    body: &[u8],
) -> ProtoResult<HttpResponse> {
    let head = format!(
        "PUT /weather.json HTTP/1.1\r\nHost: {}:{}\r\nUser-Agent: atmo-publisher/0.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\nLamport-Clock: {}\r\n\r\n",
        target.host,
        target.port,
        body.len(),
        clock
    );
    exchange(target, head.into_bytes(), body).await
}

/// Issue one `GET /weather.json`, optionally filtered by station id.
pub async fn get_records(
    target: &ServerTarget,
    clock: u64,
    station_id: Option<&str>,
) -> ProtoResult<HttpResponse> {
    let path = match station_id {
        Some(id) if !id.is_empty() => format!("/weather.json?stationID={id}"),
        _ => "/weather.json".to_string(),
    };
    let head = format!(
        "GET {} HTTP/1.1\r\nHost: {}:{}\r\nUser-Agent: atmo-reader/0.1\r\nLamport-Clock: {}\r\n\r\n",
        path, target.host, target.port, clock
    );
    exchange(target, head.into_bytes(), &[]).await
}

async fn exchange(
    target: &ServerTarget,
    head: Vec<u8>,
    body: &[u8],
) -> ProtoResult<HttpResponse> {
    let stream = TcpStream::connect((target.host.as_str(), target.port)).await?;
    let (read_half, mut write_half) = stream.into_split();

    write_half.write_all(&head).await?;
    if !body.is_empty() {
        write_half.write_all(body).await?;
    }
    write_half.flush().await?;

    let mut reader = BufReader::new(read_half);
    read_response(&mut reader).await
}
