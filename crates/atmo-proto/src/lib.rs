//! Minimal hand-rolled HTTP/1.1 framing
//!
//! Exactly the subset the aggregation protocol needs: one request per
//! connection, fixed-length bodies, no chunked encoding, no keep-alive
//! multiplexing, no compression. The server side parses requests and emits
//! responses; the client side emits the publisher/reader requests and
//! parses responses.

pub mod client;
pub mod request;
pub mod response;

pub use client::*;
pub use request::*;
pub use response::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    /// The peer closed the connection before a full message arrived.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Request line did not carry `METHOD PATH VERSION`.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// Response status line did not carry `VERSION CODE [REASON]`.
    #[error("malformed status line: {0:?}")]
    MalformedStatusLine(String),

    /// A server URL that cannot be reduced to host and port.
    #[error("invalid server url: {0:?}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProtoResult<T> = Result<T, ProtoError>;
