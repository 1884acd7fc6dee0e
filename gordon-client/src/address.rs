//! Document addresses.
//!
//! An address names a server and a document on it:
//!
//! ```text
//! [gordon:]//host[:port][/document-uuid]
//! ```
//!
//! The port defaults to 4444. A missing or empty path addresses the nil
//! document, which servers answer with their index.

use crate::error::ClientError;
use gordon_protocol::DEFAULT_PORT;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const SCHEME: &str = "gordon:";

/// A parsed document address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    original: String,
    host: String,
    port: u16,
    document: Uuid,
}

impl Address {
    pub fn parse(s: &str) -> Result<Self, ClientError> {
        let rest = s.strip_prefix(SCHEME).unwrap_or(s);
        let rest = rest
            .strip_prefix("//")
            .ok_or_else(|| ClientError::invalid_address(s, "expected //host[:port]/document"))?;

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, ""),
        };

        let (host, port) = split_host_port(s, authority)?;

        let document = if path.is_empty() {
            Uuid::nil()
        } else {
            Uuid::parse_str(path)
                .map_err(|e| ClientError::invalid_address(s, format!("bad document id: {}", e)))?
        };

        Ok(Self {
            original: s.to_string(),
            host,
            port,
            document,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, suitable for connecting.
    pub fn server(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// The addressed document; nil for the index.
    pub fn document(&self) -> Uuid {
        self.document
    }

    pub fn is_index(&self) -> bool {
        self.document.is_nil()
    }
}

fn split_host_port(address: &str, authority: &str) -> Result<(String, u16), ClientError> {
    if authority.is_empty() {
        return Err(ClientError::invalid_address(address, "missing host"));
    }

    // Bracketed IPv6 literal: [::1] or [::1]:port
    if let Some(inner) = authority.strip_prefix('[') {
        let (host, after) = inner
            .split_once(']')
            .ok_or_else(|| ClientError::invalid_address(address, "unclosed '['"))?;
        let port = match after {
            "" => DEFAULT_PORT,
            p => parse_port(address, p.strip_prefix(':').unwrap_or(p))?,
        };
        return Ok((host.to_string(), port));
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => Ok((host.to_string(), parse_port(address, port)?)),
        Some(_) => Err(ClientError::invalid_address(address, "missing host")),
        None => Ok((authority.to_string(), DEFAULT_PORT)),
    }
}

fn parse_port(address: &str, port: &str) -> Result<u16, ClientError> {
    port.parse()
        .map_err(|_| ClientError::invalid_address(address, format!("bad port {:?}", port)))
}

impl FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "208b43d9-a95d-476d-ba3b-3b64fda2507b";

    #[test]
    fn test_default_port() {
        let addr = Address::parse(&format!("//docs.example.com/{}", DOC)).unwrap();
        assert_eq!(addr.host(), "docs.example.com");
        assert_eq!(addr.port(), 4444);
        assert_eq!(addr.server(), "docs.example.com:4444");
        assert_eq!(addr.document().to_string(), DOC);
        assert!(!addr.is_index());
    }

    #[test]
    fn test_explicit_port_and_scheme() {
        let addr = Address::parse(&format!("gordon://127.0.0.1:9000/{}", DOC)).unwrap();
        assert_eq!(addr.server(), "127.0.0.1:9000");
        assert_eq!(addr.to_string(), format!("gordon://127.0.0.1:9000/{}", DOC));
    }

    #[test]
    fn test_empty_path_is_index() {
        for s in ["//localhost", "//localhost/", "//localhost:4444/"] {
            let addr = Address::parse(s).unwrap();
            assert!(addr.is_index(), "{s}");
            assert_eq!(addr.document(), Uuid::nil());
        }
    }

    #[test]
    fn test_ipv6() {
        let addr: Address = "//[::1]:5000".parse().unwrap();
        assert_eq!(addr.host(), "::1");
        assert_eq!(addr.server(), "[::1]:5000");

        let addr: Address = "//[::1]".parse().unwrap();
        assert_eq!(addr.port(), 4444);
    }

    #[test]
    fn test_invalid_addresses() {
        for s in [
            "localhost/abc",
            "//",
            "//:4444/",
            "//localhost:http/",
            "//localhost:99999/",
            "//localhost/not-a-uuid",
            "//[::1/",
        ] {
            let err = Address::parse(s).unwrap_err();
            assert!(
                matches!(err, ClientError::InvalidAddress { .. }),
                "{s}: {err:?}"
            );
        }
    }
}
