//! Server error types.

use crate::config::ConfigError;
use crate::handler::HandlerError;
use thiserror::Error;

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] gordon_protocol::ProtocolError),

    #[error("cannot resolve address {0}")]
    Resolve(String),

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    #[error("handler error: {0}")]
    Handler(#[source] HandlerError),

    #[error("handler returned no page and no error")]
    NilPage,

    #[error("request too large: {size} bytes (max {max})")]
    RequestTooLarge { size: usize, max: usize },

    #[error("connection closed before a complete request was read")]
    ConnectionClosed,

    #[error("timed out waiting for a complete request")]
    ReadTimeout,

    #[error("admission pool closed")]
    AdmissionClosed,

    #[error("listener closed")]
    Closed,

    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    #[error("TLS handshake timed out")]
    HandshakeTimeout,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ServerError {
    /// Returns whether this error ends the accept loop rather than a single
    /// connection.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ServerError::Resolve(_)
                | ServerError::Bind { .. }
                | ServerError::Accept(_)
                | ServerError::AdmissionClosed
                | ServerError::Closed
                | ServerError::TlsConfig(_)
                | ServerError::Config(_)
        )
    }
}
