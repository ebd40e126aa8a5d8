//! Response framing: status enum, server-side emit, client-side parse

use std::collections::HashMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{ProtoError, ProtoResult};

/// The status codes this protocol produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Created,
    NoContent,
    BadRequest,
    InternalServerError,
    ServiceUnavailable,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::NoContent => 204,
            Status::BadRequest => 400,
            Status::InternalServerError => 500,
            Status::ServiceUnavailable => 503,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::NoContent => "No Content",
            Status::BadRequest => "Bad Request",
            Status::InternalServerError => "Internal Server Error",
            Status::ServiceUnavailable => "Service Unavailable",
        }
    }
}

/// Write one response: status line, `Content-Type: application/json`, an
/// accurate `Content-Length`, blank line, body.
pub async fn write_response<W>(writer: &mut W, status: Status, body: &[u8]) -> ProtoResult<()>
where
    W: AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
        status.code(),
        status.reason(),
        body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// A response as seen by the publisher/reader clients.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Read one response from a buffered stream: status line, headers,
/// `Content-Length` bytes of body.
pub async fn read_response<R>(reader: &mut R) -> ProtoResult<HttpResponse>
where
    R: AsyncBufRead + Unpin,
{
    let mut status_line = String::new();
    if reader.read_line(&mut status_line).await? == 0 {
        return Err(ProtoError::ConnectionClosed);
    }
    let status_line = status_line.trim_end().to_string();

    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| ProtoError::MalformedStatusLine(status_line.clone()))?;

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(ProtoError::ConnectionClosed);
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let length = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_response_format_exact() {
        let mut out = Vec::new();
        write_response(&mut out, Status::Ok, b"[]").await.unwrap();
        assert_eq!(
            out,
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n[]"
        );
    }

    #[tokio::test]
    async fn test_empty_body_response() {
        let mut out = Vec::new();
        write_response(&mut out, Status::Created, b"").await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let mut wire = Vec::new();
        write_response(&mut wire, Status::ServiceUnavailable, b"overloaded")
            .await
            .unwrap();

        let mut reader = BufReader::new(Cursor::new(wire));
        let response = read_response(&mut reader).await.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.body, b"overloaded");
        assert_eq!(
            response.headers.get("content-type").unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_malformed_status_line() {
        let mut reader = BufReader::new(Cursor::new(b"garbage\r\n\r\n".to_vec()));
        assert!(matches!(
            read_response(&mut reader).await,
            Err(ProtoError::MalformedStatusLine(_))
        ));
    }

    #[test]
    fn test_status_reasons() {
        assert_eq!(Status::Ok.reason(), "OK");
        assert_eq!(Status::NoContent.code(), 204);
        assert_eq!(Status::BadRequest.reason(), "Bad Request");
        assert_eq!(Status::ServiceUnavailable.code(), 503);
    }
}
