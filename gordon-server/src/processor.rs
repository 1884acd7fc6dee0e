//! Per-connection request pipeline.
//!
//! Each connection carries exactly one exchange, handled strictly in order:
//!
//! 1. read one framed request within the read deadline, refusing frames
//!    over the size limit
//! 2. decode it
//! 3. hand it to the [`Handler`]
//! 4. encode and write the page, then shut down the write side
//! 5. log the outcome
//!
//! Any failure ends the exchange without writing a response; the peer just
//! sees the connection close.

use crate::config::DEFAULT_READ_TIMEOUT_SECS;
use crate::error::ServerError;
use crate::handler::Handler;
use bytes::BytesMut;
use gordon_protocol::{Decoder, Encoder, Page, ProtocolError, Request, Verb, FRAME_HEADER_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

const READ_CHUNK_SIZE: usize = 8192;

/// Summary of one successfully served request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub verb: Verb,
    pub document: Uuid,
    pub remote_address: SocketAddr,
    pub duration: Duration,
    /// Whether the page sent back has error status.
    pub is_error: bool,
    /// Encoded page size in bytes, excluding the frame header.
    pub size: usize,
}

/// Runs the request pipeline against a [`Handler`].
#[derive(Clone)]
pub struct RequestProcessor {
    handler: Arc<dyn Handler>,
    max_request_size: usize,
    read_timeout: Duration,
}

impl RequestProcessor {
    pub fn new(handler: Arc<dyn Handler>, max_request_size: usize) -> Self {
        Self {
            handler,
            max_request_size,
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }

    /// Sets how long a peer has to deliver its whole request.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn max_request_size(&self) -> usize {
        self.max_request_size
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Serves the single request carried by `stream`.
    pub async fn process<S>(
        &self,
        stream: &mut S,
        remote_address: SocketAddr,
    ) -> Result<RequestOutcome, ServerError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let start = Instant::now();

        // Bounds the whole request, not each read.
        let request = tokio::time::timeout(self.read_timeout, self.read_request(stream))
            .await
            .map_err(|_| ServerError::ReadTimeout)??;
        tracing::debug!(
            "[{}] {} {}",
            remote_address,
            request.verb,
            request.id
        );

        let page = self.dispatch(request.clone()).await?;
        let frame = Encoder::encode_page(&page)?;
        stream.write_all(&frame).await?;
        stream.shutdown().await?;

        let outcome = RequestOutcome {
            verb: request.verb,
            document: request.id,
            remote_address,
            duration: start.elapsed(),
            is_error: page.is_error(),
            size: frame.len() - FRAME_HEADER_SIZE,
        };

        tracing::info!(
            verb = %outcome.verb,
            document = %outcome.document,
            remote_address = %outcome.remote_address,
            duration = ?outcome.duration,
            is_error = outcome.is_error,
            size = outcome.size,
            "request"
        );

        Ok(outcome)
    }

    /// Reads and decodes one framed request.
    ///
    /// The frame header is checked against the size limit before any of the
    /// body is read.
    pub async fn read_request<S>(&self, stream: &mut S) -> Result<Request, ServerError>
    where
        S: AsyncRead + Unpin,
    {
        let mut decoder = Decoder::with_max_payload(self.max_request_size);
        let mut chunk = BytesMut::zeroed(READ_CHUNK_SIZE);

        loop {
            match decoder.decode_request() {
                Ok(Some(request)) => return Ok(request),
                Ok(None) => {}
                Err(ProtocolError::FrameTooLarge { size, max }) => {
                    return Err(ServerError::RequestTooLarge { size, max })
                }
                Err(e) => return Err(e.into()),
            }

            let n = stream.read(&mut chunk[..]).await?;
            if n == 0 {
                return Err(ServerError::ConnectionClosed);
            }
            decoder.extend(&chunk[..n]);
        }
    }

    /// Passes a request to the handler on the blocking pool.
    ///
    /// A handler that returns neither a page nor an error yields
    /// [`ServerError::NilPage`].
    pub async fn dispatch(&self, request: Request) -> Result<Page, ServerError> {
        let handler = self.handler.clone();
        let result = tokio::task::spawn_blocking(move || handler.serve(&request))
            .await
            .map_err(|e| ServerError::Handler(Box::new(e)))?;

        match result {
            Ok(Some(page)) => Ok(page),
            Ok(None) => Err(ServerError::NilPage),
            Err(e) => Err(ServerError::Handler(e)),
        }
    }
}

impl std::fmt::Debug for RequestProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestProcessor")
            .field("max_request_size", &self.max_request_size)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}
