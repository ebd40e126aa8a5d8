//! Server-side request parsing

use std::collections::HashMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::{ProtoError, ProtoResult};

/// A parsed HTTP request.
///
/// Header names are lower-cased at parse time. The body is populated for
/// PUT only, with exactly `Content-Length` bytes.
#[derive(Debug, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// `Lamport-Clock` header, 0 when missing or not a decimal integer.
    pub fn lamport_clock(&self) -> u64 {
        self.headers
            .get("lamport-clock")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// `Content-Length` header, 0 when missing or not a decimal integer.
    pub fn content_length(&self) -> usize {
        self.headers
            .get("content-length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Extract a query parameter from the request path.
    pub fn query_param(&self, key: &str) -> Option<String> {
        let (_, query) = self.path.split_once('?')?;
        query.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == key).then(|| v.to_string())
        })
    }

    /// The `stationID` filter of a GET, when present.
    pub fn station_id(&self) -> Option<String> {
        self.query_param("stationID")
    }
}

/// Read one request from a buffered stream.
///
/// Returns [`ProtoError::ConnectionClosed`] on EOF before the request line,
/// [`ProtoError::MalformedRequestLine`] when the line has fewer than three
/// whitespace-separated tokens (the caller answers 400), and IO errors as
/// they occur (the caller drops the connection).
pub async fn read_request<R>(reader: &mut R) -> ProtoResult<HttpRequest>
where
    R: AsyncBufRead + Unpin,
{
    let request_line = match read_line(reader).await? {
        Some(line) => line,
        None => return Err(ProtoError::ConnectionClosed),
    };

    let mut parts = request_line.split_whitespace();
    let (method, path) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(path), Some(_version)) => (method.to_string(), path.to_string()),
        _ => return Err(ProtoError::MalformedRequestLine(request_line)),
    };

    let mut headers = HashMap::new();
    loop {
        let line = match read_line(reader).await? {
            Some(line) => line,
            None => return Err(ProtoError::ConnectionClosed),
        };
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let request = HttpRequest {
        method,
        path,
        headers,
        body: Vec::new(),
    };

    // Only PUT carries a body; read exactly Content-Length bytes.
    if request.method == "PUT" {
        let length = request.content_length();
        if length > 0 {
            let mut body = vec![0u8; length];
            reader.read_exact(&mut body).await?;
            return Ok(HttpRequest { body, ..request });
        }
    }

    Ok(request)
}

/// Read one CRLF-terminated line, `None` on clean EOF.
async fn read_line<R>(reader: &mut R) -> ProtoResult<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    async fn parse(raw: &[u8]) -> ProtoResult<HttpRequest> {
        let mut reader = BufReader::new(Cursor::new(raw.to_vec()));
        read_request(&mut reader).await
    }

    #[tokio::test]
    async fn test_parse_get() {
        let raw = b"GET /weather.json?stationID=SA01 HTTP/1.1\r\nHost: localhost\r\nLamport-Clock: 3\r\n\r\n";
        let req = parse(raw).await.unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.lamport_clock(), 3);
        assert_eq!(req.station_id().as_deref(), Some("SA01"));
        assert!(req.body.is_empty());
    }

    #[tokio::test]
    async fn test_parse_put_with_body() {
        let body = br#"{"id":"VIC01"}"#;
        let raw = format!(
            "PUT /weather.json HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\nLamport-Clock: 1\r\n\r\n",
            body.len()
        );
        let mut bytes = raw.into_bytes();
        bytes.extend_from_slice(body);

        let req = parse(&bytes).await.unwrap();
        assert_eq!(req.method, "PUT");
        assert_eq!(req.lamport_clock(), 1);
        assert_eq!(req.body, body);
    }

    #[tokio::test]
    async fn test_header_names_lower_cased() {
        let raw = b"GET /weather.json HTTP/1.1\r\nLAMPORT-CLOCK: 9\r\n\r\n";
        let req = parse(raw).await.unwrap();
        assert_eq!(req.headers.get("lamport-clock").unwrap(), "9");
        assert_eq!(req.lamport_clock(), 9);
    }

    #[tokio::test]
    async fn test_short_request_line_is_malformed() {
        let raw = b"GET /weather.json\r\n\r\n";
        assert!(matches!(
            parse(raw).await,
            Err(ProtoError::MalformedRequestLine(_))
        ));
    }

    #[tokio::test]
    async fn test_eof_before_request_line() {
        assert!(matches!(
            parse(b"").await,
            Err(ProtoError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_missing_clock_defaults_to_zero() {
        let raw = b"GET /weather.json HTTP/1.1\r\n\r\n";
        let req = parse(raw).await.unwrap();
        assert_eq!(req.lamport_clock(), 0);
    }

    #[tokio::test]
    async fn test_garbage_clock_defaults_to_zero() {
        let raw = b"GET /weather.json HTTP/1.1\r\nLamport-Clock: banana\r\n\r\n";
        let req = parse(raw).await.unwrap();
        assert_eq!(req.lamport_clock(), 0);
    }

    #[tokio::test]
    async fn test_truncated_body_is_io_error() {
        let raw = b"PUT /weather.json HTTP/1.1\r\nContent-Length: 50\r\n\r\n{\"id\":";
        assert!(matches!(parse(raw).await, Err(ProtoError::Io(_))));
    }

    #[tokio::test]
    async fn test_query_absent() {
        let raw = b"GET /weather.json HTTP/1.1\r\n\r\n";
        let req = parse(raw).await.unwrap();
        assert_eq!(req.station_id(), None);
    }
}
