//! # gordon-client
//!
//! Client library for the gordon document protocol.
//!
//! This crate provides:
//! - Parsing of `//host[:port]/document` addresses
//! - One-shot requests: connect, send a request, read the page
//! - Optional TLS, including an insecure mode for self-signed servers

pub mod address;
pub mod client;
pub mod connection;
pub mod error;
pub mod stream;
pub mod tls;

pub use address::Address;
pub use client::Client;
pub use connection::{ConnectionConfig, TlsClientConfig};
pub use error::ClientError;
pub use stream::ClientStream;
