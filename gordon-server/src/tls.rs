//! TLS acceptor construction from PEM files.

use crate::config::TlsConfig;
use crate::error::ServerError;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::{danger::ClientCertVerifier, WebPkiClientVerifier};
use rustls::RootCertStore;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

/// Builds the acceptor used to wrap every accepted connection.
///
/// Returns `Ok(None)` when TLS is disabled.
pub fn acceptor_from_config(config: &TlsConfig) -> Result<Option<TlsAcceptor>, ServerError> {
    if !config.enabled {
        return Ok(None);
    }
    create_tls_acceptor(config).map(Some)
}

/// Loads certificates and creates a TLS acceptor.
pub fn create_tls_acceptor(config: &TlsConfig) -> Result<TlsAcceptor, ServerError> {
    let cert_path = config
        .cert_path
        .as_deref()
        .ok_or_else(|| ServerError::TlsConfig("cert_path not set".into()))?;
    let key_path = config
        .key_path
        .as_deref()
        .ok_or_else(|| ServerError::TlsConfig("key_path not set".into()))?;

    let client_ca_path = match (config.require_client_cert, config.client_ca_path.as_deref()) {
        (true, None) => {
            return Err(ServerError::TlsConfig(
                "client_ca_path not set for mTLS".into(),
            ))
        }
        (true, Some(path)) => Some(path),
        (false, _) => None,
    };

    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    let builder = rustls::ServerConfig::builder();
    let server_config = match client_ca_path {
        Some(path) => builder.with_client_cert_verifier(client_verifier(path)?),
        None => builder.with_no_client_auth(),
    }
    .with_single_cert(certs, key)
    .map_err(|e| ServerError::TlsConfig(format!("invalid server cert/key: {}", e)))?;

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

fn client_verifier(ca_path: &Path) -> Result<Arc<dyn ClientCertVerifier>, ServerError> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(ca_path)? {
        roots
            .add(cert)
            .map_err(|e| ServerError::TlsConfig(format!("invalid client CA cert: {}", e)))?;
    }

    WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .map_err(|e| ServerError::TlsConfig(format!("failed to build client verifier: {}", e)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ServerError> {
    let file = File::open(path)
        .map_err(|e| ServerError::TlsConfig(format!("cannot open cert file {:?}: {}", path, e)))?;
    let mut reader = BufReader::new(file);

    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::TlsConfig(format!("invalid cert file {:?}: {}", path, e)))?;

    if certs.is_empty() {
        return Err(ServerError::TlsConfig(format!(
            "no certificates found in {:?}",
            path
        )));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, ServerError> {
    let file = File::open(path)
        .map_err(|e| ServerError::TlsConfig(format!("cannot open key file {:?}: {}", path, e)))?;
    let mut reader = BufReader::new(file);

    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| ServerError::TlsConfig(format!("invalid key file {:?}: {}", path, e)))?
        .ok_or_else(|| ServerError::TlsConfig(format!("no private key found in {:?}", path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn expect_tls_error(config: &TlsConfig, needle: &str) {
        match create_tls_acceptor(config) {
            Err(e) => assert!(e.to_string().contains(needle), "{e}"),
            Ok(_) => panic!("expected error containing {needle:?}"),
        }
    }

    #[test]
    fn test_disabled_tls_has_no_acceptor() {
        let config = TlsConfig::default();
        assert!(acceptor_from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_missing_cert_file() {
        let err = load_certs(Path::new("/nonexistent/cert.pem")).unwrap_err();
        assert!(err.to_string().contains("cannot open"));
    }

    #[test]
    fn test_cert_file_without_certs() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"just some text\n").unwrap();

        let err = load_certs(file.path()).unwrap_err();
        assert!(err.to_string().contains("no certificates"));
    }

    #[test]
    fn test_key_file_without_key() {
        let mut key_file = NamedTempFile::new().unwrap();
        key_file.write_all(b"not a valid key").unwrap();

        let err = load_private_key(key_file.path()).unwrap_err();
        assert!(err.to_string().contains("no private key"));
    }

    #[test]
    fn test_paths_required() {
        expect_tls_error(
            &TlsConfig {
                enabled: true,
                key_path: Some("/some/key.pem".into()),
                ..Default::default()
            },
            "cert_path not set",
        );
        expect_tls_error(
            &TlsConfig {
                enabled: true,
                cert_path: Some("/some/cert.pem".into()),
                ..Default::default()
            },
            "key_path not set",
        );
    }

    #[test]
    fn test_mtls_requires_ca_before_loading_files() {
        expect_tls_error(
            &TlsConfig {
                enabled: true,
                cert_path: Some("/nonexistent/cert.pem".into()),
                key_path: Some("/nonexistent/key.pem".into()),
                require_client_cert: true,
                client_ca_path: None,
            },
            "client_ca_path not set",
        );
    }
}
