//! Admission-controlled listener.

use crate::config::{ConfigError, NetworkConfig};
use crate::error::ServerError;
use crate::handler::Handler;
use crate::processor::RequestProcessor;
use crate::stream::ConnStream;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{lookup_host, TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tokio_rustls::TlsAcceptor;

/// Listener configuration.
#[derive(Clone)]
pub struct ListenerConfig {
    /// TLS acceptor (if TLS is enabled).
    pub tls_acceptor: Option<TlsAcceptor>,
    /// Connections processed at once; further connections wait for a slot.
    pub max_connections: usize,
    /// Deadline for the TLS handshake.
    pub handshake_timeout: Duration,
    /// Largest encoded request accepted, in bytes.
    pub max_request_size: usize,
    /// Deadline for a peer to deliver its whole request once admitted.
    pub read_timeout: Duration,
}

impl std::fmt::Debug for ListenerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerConfig")
            .field("tls_enabled", &self.tls_acceptor.is_some())
            .field("max_connections", &self.max_connections)
            .field("handshake_timeout", &self.handshake_timeout)
            .field("max_request_size", &self.max_request_size)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self::from_network(&NetworkConfig::default())
    }
}

impl ListenerConfig {
    pub fn from_network(network: &NetworkConfig) -> Self {
        Self {
            tls_acceptor: None,
            max_connections: network.max_connections,
            handshake_timeout: network.handshake_timeout(),
            max_request_size: network.max_request_size,
            read_timeout: network.read_timeout(),
        }
    }

    /// Sets the TLS acceptor.
    pub fn with_tls(mut self, acceptor: TlsAcceptor) -> Self {
        self.tls_acceptor = Some(acceptor);
        self
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Returns whether TLS is enabled.
    pub fn tls_enabled(&self) -> bool {
        self.tls_acceptor.is_some()
    }
}

/// Listener lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Created,
    Listening(SocketAddr),
    Closed,
}

/// Server statistics.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub connections_total: AtomicU64,
    pub connections_active: AtomicU64,
    pub requests_total: AtomicU64,
    pub errors_total: AtomicU64,
}

impl ServerStats {
    pub fn connections_active(&self) -> u64 {
        self.connections_active.load(Ordering::Relaxed)
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn errors_total(&self) -> u64 {
        self.errors_total.load(Ordering::Relaxed)
    }
}

/// Accepts connections and runs each one through the request pipeline,
/// never processing more than `max_connections` at once.
pub struct Listener {
    processor: RequestProcessor,
    config: ListenerConfig,
    state: Mutex<ListenerState>,
    stats: Arc<ServerStats>,
    shutdown: watch::Sender<bool>,
}

impl Listener {
    pub fn new(handler: Arc<dyn Handler>, config: ListenerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            processor: RequestProcessor::new(handler, config.max_request_size)
                .with_read_timeout(config.read_timeout),
            config,
            state: Mutex::new(ListenerState::Created),
            stats: Arc::new(ServerStats::default()),
            shutdown,
        }
    }

    pub fn state(&self) -> ListenerState {
        *self.state.lock()
    }

    /// Bound address, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self.state() {
            ListenerState::Listening(addr) => Some(addr),
            _ => None,
        }
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// Resolves `address` and binds a socket to it.
    pub async fn bind(&self, address: &str) -> Result<TcpListener, ServerError> {
        if self.state() == ListenerState::Closed {
            return Err(ServerError::Closed);
        }

        let addr = lookup_host(address)
            .await
            .map_err(|e| ServerError::Resolve(format!("{}: {}", address, e)))?
            .next()
            .ok_or_else(|| ServerError::Resolve(address.to_string()))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local = listener.local_addr()?;

        let mut state = self.state.lock();
        if *state == ListenerState::Closed {
            return Err(ServerError::Closed);
        }
        *state = ListenerState::Listening(local);
        Ok(listener)
    }

    /// Runs the accept loop until [`close`](Self::close) is called or an
    /// accept or admission failure ends it.
    ///
    /// Connections already being processed are left to finish.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let ceiling = self.config.max_connections;
        if ceiling == 0 || ceiling > Semaphore::MAX_PERMITS {
            *self.state.lock() = ListenerState::Closed;
            return Err(ConfigError::ValidationError(format!(
                "max_connections must be between 1 and {}",
                Semaphore::MAX_PERMITS
            ))
            .into());
        }
        let admission = Arc::new(Semaphore::new(ceiling));
        let mut shutdown = self.shutdown.subscribe();

        let tls_mode = if self.config.tls_enabled() {
            "TLS"
        } else {
            "plain"
        };
        tracing::info!(
            "Listening on {} ({}, max {} connections)",
            listener.local_addr()?,
            tls_mode,
            self.config.max_connections
        );

        let result = self.accept_loop(&listener, &admission, &mut shutdown).await;

        *self.state.lock() = ListenerState::Closed;
        match &result {
            Ok(()) => tracing::info!("Listener closed"),
            Err(e) => tracing::error!("Listener stopped: {}", e),
        }
        result
    }

    async fn accept_loop(
        &self,
        listener: &TcpListener,
        admission: &Arc<Semaphore>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), ServerError> {
        loop {
            let (tcp_stream, addr) = tokio::select! {
                _ = wait_closed(shutdown) => return Ok(()),
                accepted = listener.accept() => accepted.map_err(ServerError::Accept)?,
            };

            let permit = tokio::select! {
                _ = wait_closed(shutdown) => return Ok(()),
                permit = admission.clone().acquire_owned() => {
                    permit.map_err(|_| ServerError::AdmissionClosed)?
                }
            };

            self.stats.connections_total.fetch_add(1, Ordering::Relaxed);
            self.stats.connections_active.fetch_add(1, Ordering::Relaxed);

            let processor = self.processor.clone();
            let acceptor = self.config.tls_acceptor.clone();
            let handshake_timeout = self.config.handshake_timeout;
            let stats = self.stats.clone();

            tokio::spawn(async move {
                let _permit = permit;

                let result: Result<_, ServerError> = async {
                    let mut stream =
                        accept_stream(tcp_stream, acceptor.as_ref(), handshake_timeout).await?;
                    tracing::debug!(
                        transport = stream.transport(),
                        server_name = stream.server_name(),
                        "[{}] connection admitted",
                        addr
                    );
                    processor.process(&mut stream, addr).await
                }
                .await;

                match result {
                    Ok(_) => {
                        stats.requests_total.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        tracing::warn!("[{}] connection failed: {}", addr, e);
                        stats.errors_total.fetch_add(1, Ordering::Relaxed);
                    }
                }

                stats.connections_active.fetch_sub(1, Ordering::Relaxed);
            });
        }
    }

    /// Binds `address` and serves until closed.
    pub async fn listen_and_serve(&self, address: &str) -> Result<(), ServerError> {
        let listener = self.bind(address).await?;
        self.serve(listener).await
    }

    /// Stops accepting connections. In-flight requests run to completion.
    pub fn close(&self) {
        *self.state.lock() = ListenerState::Closed;
        self.shutdown.send_replace(true);
    }
}

/// Resolves once the listener has been closed.
async fn wait_closed(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Wraps an accepted socket in TLS when an acceptor is configured.
async fn accept_stream(
    tcp_stream: TcpStream,
    acceptor: Option<&TlsAcceptor>,
    handshake_timeout: Duration,
) -> Result<ConnStream, ServerError> {
    match acceptor {
        Some(acceptor) => {
            let stream = tokio::time::timeout(handshake_timeout, acceptor.accept(tcp_stream))
                .await
                .map_err(|_| ServerError::HandshakeTimeout)?
                .map_err(|e| ServerError::TlsHandshake(e.to_string()))?;
            Ok(ConnStream::tls(stream))
        }
        None => Ok(ConnStream::plain(tcp_stream)),
    }
}
