//! High-level client API.

use crate::address::Address;
use crate::connection::{connect, exchange, ConnectionConfig};
use crate::error::ClientError;
use gordon_protocol::{Page, Request, Verb};

/// A gordon client.
///
/// Each request opens its own connection; the server answers exactly one
/// request per connection.
#[derive(Debug, Clone)]
pub struct Client {
    config: ConnectionConfig,
}

impl Client {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Client for the server named by `address`, with default settings.
    pub fn for_address(address: &Address) -> Self {
        Self::new(ConnectionConfig::new(address.server()))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Sends `request` to the configured server and returns its page.
    pub async fn request(&self, request: &Request) -> Result<Page, ClientError> {
        self.request_to(&self.config.server, request).await
    }

    /// Sends `verb` for the document named by `address` to the server it names.
    pub async fn fetch(&self, verb: Verb, address: &Address) -> Result<Page, ClientError> {
        let request = Request::new(verb, address.document());
        self.request_to(&address.server(), &request).await
    }

    /// Reads the server's page index.
    pub async fn index(&self) -> Result<Page, ClientError> {
        self.request(&Request::index()).await
    }

    async fn request_to(&self, server: &str, request: &Request) -> Result<Page, ClientError> {
        let mut stream = connect(server, &self.config).await?;
        tracing::debug!(
            verb = %request.verb,
            document = %request.id,
            transport = stream.transport(),
            peer = ?stream.peer_addr().ok(),
            "sending request"
        );

        let page = tokio::time::timeout(
            self.config.request_timeout,
            exchange(&mut stream, request, self.config.max_response_size),
        )
        .await
        .map_err(|_| ClientError::Timeout)??;

        Ok(page)
    }
}
