//! Server configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file named by GORDON_CONFIG, if set
//! 3. Environment variables

use gordon_protocol::{DEFAULT_MAX_REQUEST_SIZE, DEFAULT_PORT, MAX_PAYLOAD_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default admission ceiling.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Default TLS handshake deadline, in seconds.
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 5;

/// Default deadline for a peer to deliver its whole request, in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 5;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network configuration.
    pub network: NetworkConfig,
    /// TLS configuration.
    pub tls: TlsConfig,
    /// Where documents are loaded from.
    pub documents: DocumentsConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("GORDON_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.network.apply_env_overrides();
        self.tls.apply_env_overrides();
        self.documents.apply_env_overrides();
    }

    /// Checks the whole configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        self.tls.validate()
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind to. Host names are resolved at bind time.
    pub bind_addr: String,
    /// Maximum connections processed at once.
    pub max_connections: usize,
    /// TLS handshake deadline in seconds.
    pub handshake_timeout_secs: u64,
    /// Deadline in seconds for reading one complete request.
    pub read_timeout_secs: u64,
    /// Largest encoded request accepted, in bytes.
    pub max_request_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}

impl NetworkConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("GORDON_BIND") {
            if !addr.is_empty() {
                self.bind_addr = addr;
            }
        }

        if let Ok(max) = std::env::var("GORDON_MAX_CONNECTIONS") {
            if let Ok(n) = max.parse() {
                self.max_connections = n;
            }
        }

        if let Ok(timeout) = std::env::var("GORDON_HANDSHAKE_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.handshake_timeout_secs = secs;
            }
        }

        if let Ok(timeout) = std::env::var("GORDON_READ_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.read_timeout_secs = secs;
            }
        }

        if let Ok(size) = std::env::var("GORDON_MAX_REQUEST_SIZE") {
            if let Ok(n) = size.parse() {
                self.max_request_size = n;
            }
        }
    }

    /// Returns the handshake deadline as Duration.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Returns the request read deadline as Duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.is_empty() {
            return Err(ConfigError::ValidationError(
                "bind_addr must not be empty".to_string(),
            ));
        }
        if self.max_connections == 0 || self.max_connections > Semaphore::MAX_PERMITS {
            return Err(ConfigError::ValidationError(format!(
                "max_connections must be between 1 and {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.read_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "read_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.max_request_size == 0 || self.max_request_size > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "max_request_size must be between 1 and {}",
                MAX_PAYLOAD_SIZE
            )));
        }
        Ok(())
    }
}

/// TLS configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Enable TLS.
    #[serde(default)]
    pub enabled: bool,
    /// Path to PEM-encoded server certificate file.
    #[serde(default)]
    pub cert_path: Option<PathBuf>,
    /// Path to PEM-encoded private key file.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    /// Require client certificate authentication (mTLS).
    #[serde(default)]
    pub require_client_cert: bool,
    /// Path to PEM-encoded CA certificate(s) for verifying client certs.
    /// Required if require_client_cert is true.
    #[serde(default)]
    pub client_ca_path: Option<PathBuf>,
}

impl TlsConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(enabled) = std::env::var("GORDON_TLS_ENABLED") {
            self.enabled = parse_flag(&enabled);
        }
        if let Ok(path) = std::env::var("GORDON_TLS_CERT") {
            self.cert_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("GORDON_TLS_KEY") {
            self.key_path = Some(PathBuf::from(path));
        }
        if let Ok(require) = std::env::var("GORDON_TLS_REQUIRE_CLIENT_CERT") {
            self.require_client_cert = parse_flag(&require);
        }
        if let Ok(path) = std::env::var("GORDON_TLS_CLIENT_CA") {
            self.client_ca_path = Some(PathBuf::from(path));
        }
    }

    /// Validates TLS configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }

        if self.cert_path.is_none() {
            return Err(ConfigError::ValidationError(
                "TLS enabled but cert_path not set".to_string(),
            ));
        }
        if self.key_path.is_none() {
            return Err(ConfigError::ValidationError(
                "TLS enabled but key_path not set".to_string(),
            ));
        }
        if self.require_client_cert && self.client_ca_path.is_none() {
            return Err(ConfigError::ValidationError(
                "mTLS enabled but client_ca_path not set".to_string(),
            ));
        }

        Ok(())
    }
}

/// Document source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Optional YAML file holding a list of pages.
    pub path: Option<PathBuf>,
    /// Serve the bundled sample documents.
    pub include_samples: bool,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            path: None,
            include_samples: true,
        }
    }
}

impl DocumentsConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("GORDON_DOCUMENTS") {
            if !path.is_empty() {
                self.path = Some(PathBuf::from(path));
            }
        }
        if let Ok(samples) = std::env::var("GORDON_SAMPLE_DOCUMENTS") {
            self.include_samples = parse_flag(&samples);
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.bind_addr, "0.0.0.0:4444");
        assert_eq!(config.network.max_connections, 1024);
        assert_eq!(config.network.handshake_timeout(), Duration::from_secs(5));
        assert_eq!(config.network.read_timeout(), Duration::from_secs(5));
        assert_eq!(config.network.max_request_size, 64 * 1024);
        assert!(!config.tls.enabled);
        assert!(config.documents.include_samples);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = Config::default();
        config.network.bind_addr = "127.0.0.1:9000".into();
        config.documents.path = Some(PathBuf::from("/srv/docs.yaml"));

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.network.bind_addr, config.network.bind_addr);
        assert_eq!(parsed.documents.path, config.documents.path);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "network:\n  max_connections: 8").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.network.max_connections, 8);
        assert_eq!(config.network.bind_addr, "0.0.0.0:4444");
        assert!(config.documents.include_samples);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/gordon.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(..)));
        assert!(err.to_string().contains("/nonexistent/gordon.yaml"));
    }

    #[test]
    fn test_save_and_reload() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.network.handshake_timeout_secs = 11;
        config.save(file.path()).unwrap();

        let loaded = Config::from_file(file.path()).unwrap();
        assert_eq!(loaded.network.handshake_timeout_secs, 11);
    }

    #[test]
    fn test_network_validation() {
        let mut network = NetworkConfig {
            max_connections: 0,
            ..Default::default()
        };
        assert!(network.validate().is_err());

        network.max_connections = 1;
        network.max_request_size = MAX_PAYLOAD_SIZE + 1;
        assert!(network.validate().is_err());

        network.max_request_size = 512;
        assert!(network.validate().is_ok());

        network.read_timeout_secs = 0;
        assert!(network
            .validate()
            .unwrap_err()
            .to_string()
            .contains("read_timeout_secs"));
    }

    #[test]
    fn test_max_connections_capped_at_semaphore_limit() {
        let mut network = NetworkConfig {
            max_connections: Semaphore::MAX_PERMITS + 1,
            ..Default::default()
        };
        let err = network.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("max_connections"));

        network.max_connections = usize::MAX;
        assert!(network.validate().is_err());

        network.max_connections = Semaphore::MAX_PERMITS;
        assert!(network.validate().is_ok());
    }

    #[test]
    fn test_tls_validation() {
        let mut tls = TlsConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(tls.validate().unwrap_err().to_string().contains("cert_path"));

        tls.cert_path = Some("cert.pem".into());
        assert!(tls.validate().unwrap_err().to_string().contains("key_path"));

        tls.key_path = Some("key.pem".into());
        assert!(tls.validate().is_ok());

        tls.require_client_cert = true;
        assert!(tls
            .validate()
            .unwrap_err()
            .to_string()
            .contains("client_ca_path"));
    }

    #[test]
    fn test_env_overrides() {
        // Only this test reads the environment.
        std::env::set_var("GORDON_MAX_CONNECTIONS", "7");
        std::env::set_var("GORDON_HANDSHAKE_TIMEOUT", "not-a-number");
        std::env::set_var("GORDON_READ_TIMEOUT", "2");
        std::env::set_var("GORDON_SAMPLE_DOCUMENTS", "false");

        let config = Config::from_env();

        std::env::remove_var("GORDON_MAX_CONNECTIONS");
        std::env::remove_var("GORDON_HANDSHAKE_TIMEOUT");
        std::env::remove_var("GORDON_READ_TIMEOUT");
        std::env::remove_var("GORDON_SAMPLE_DOCUMENTS");

        assert_eq!(config.network.max_connections, 7);
        assert_eq!(config.network.handshake_timeout_secs, 5);
        assert_eq!(config.network.read_timeout(), Duration::from_secs(2));
        assert!(!config.documents.include_samples);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag("0"));
    }
}
