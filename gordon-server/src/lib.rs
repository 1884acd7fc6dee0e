//! # gordon-server
//!
//! Server for the gordon document protocol.
//!
//! This crate provides:
//! - An admission-controlled listener that bounds concurrent connections
//! - The per-connection request pipeline (read, decode, handle, encode, write)
//! - The [`Handler`] trait and an in-memory [`DocumentStore`]
//! - YAML/environment configuration
//! - Optional TLS support

pub mod config;
pub mod error;
pub mod handler;
pub mod listener;
pub mod processor;
pub mod store;
pub mod stream;
pub mod tls;

pub use config::{Config, ConfigError, DocumentsConfig, NetworkConfig, TlsConfig};
pub use error::ServerError;
pub use handler::{handler_fn, FnHandler, Handler, HandlerError};
pub use listener::{Listener, ListenerConfig, ListenerState, ServerStats};
pub use processor::{RequestOutcome, RequestProcessor};
pub use store::DocumentStore;
pub use stream::ConnStream;
