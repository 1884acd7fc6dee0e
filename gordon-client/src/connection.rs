//! Connection setup and the framed request/response exchange.

use crate::error::ClientError;
use crate::stream::ClientStream;
use crate::tls::create_tls_connector;
use gordon_protocol::{Decoder, Encoder, Page, Request, MAX_PAYLOAD_SIZE};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time allowed for writing the request and reading the page.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// TLS configuration for client connections.
#[derive(Debug, Clone, Default)]
pub struct TlsClientConfig {
    /// PEM CA bundle used to verify the server. Bundled web roots if unset.
    pub ca_cert_path: Option<PathBuf>,
    pub client_cert_path: Option<PathBuf>,
    pub client_key_path: Option<PathBuf>,
    /// Accept any server certificate.
    pub insecure: bool,
    /// SNI name; defaults to the address host.
    pub server_name: Option<String>,
}

impl TlsClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert_path = Some(path.into());
        self
    }

    pub fn with_client_cert(
        mut self,
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        self.client_cert_path = Some(cert_path.into());
        self.client_key_path = Some(key_path.into());
        self
    }

    pub fn with_insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }
}

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server to contact, as `host:port`.
    pub server: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Largest response payload accepted.
    pub max_response_size: usize,
    /// TLS settings; plain TCP when unset.
    pub tls: Option<TlsClientConfig>,
}

impl ConnectionConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_response_size: MAX_PAYLOAD_SIZE,
            tls: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size.min(MAX_PAYLOAD_SIZE);
        self
    }

    pub fn with_tls(mut self, tls: TlsClientConfig) -> Self {
        self.tls = Some(tls);
        self
    }
}

/// Opens a connection to `server`, upgrading to TLS when configured.
pub async fn connect(server: &str, config: &ConnectionConfig) -> Result<ClientStream, ClientError> {
    tracing::debug!("Connecting to {}...", server);

    let tcp_stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(server))
        .await
        .map_err(|_| {
            tracing::debug!("Connection timeout");
            ClientError::Timeout
        })??;

    tcp_stream.set_nodelay(true).ok();

    let Some(ref tls) = config.tls else {
        return Ok(ClientStream::plain(tcp_stream));
    };

    if tls.insecure {
        tracing::warn!("Using insecure TLS (certificate verification disabled)");
    }
    let (connector, server_name) = create_tls_connector(tls, host_of(server))?;

    tracing::debug!("Performing TLS handshake...");
    let stream = tokio::time::timeout(
        config.connect_timeout,
        connector.connect(server_name, tcp_stream),
    )
    .await
    .map_err(|_| ClientError::Timeout)?
    .map_err(|e| ClientError::TlsHandshake(e.to_string()))?;

    let stream = ClientStream::tls(stream);
    tracing::debug!("Connected to {} over {}", server, stream.transport());
    Ok(stream)
}

/// Writes one framed request and reads one framed page back.
pub async fn exchange<S>(
    stream: &mut S,
    request: &Request,
    max_response_size: usize,
) -> Result<Page, ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let bytes = Encoder::encode_request(request)?;
    stream.write_all(&bytes).await?;
    stream.flush().await?;

    let mut decoder = Decoder::with_max_payload(max_response_size);
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        if let Some(page) = decoder.decode_page()? {
            return Ok(page);
        }

        let n = stream.read(&mut chunk[..]).await?;
        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }
        decoder.extend(&chunk[..n]);
    }
}

fn host_of(server: &str) -> &str {
    let host = match server.rsplit_once(':') {
        Some((host, _)) => host,
        None => server,
    };
    host.trim_start_matches('[').trim_end_matches(']')
}
