//! gordon-cli - fetch a document from a gordon server and print it.

mod render;

use clap::Parser;
use colored::Colorize;
use gordon_client::{Address, Client, ConnectionConfig, TlsClientConfig};
use gordon_protocol::Verb;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gordon-cli")]
#[command(about = "Request a document from a gordon server")]
#[command(version)]
struct Cli {
    /// Verb to send, case insensitive
    #[arg(short = 'X', long = "verb", default_value = "READ")]
    verb: Verb,

    /// Print the page as JSON instead of formatted text
    #[arg(long)]
    json: bool,

    /// Connect and request timeout, in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    // ===== TLS Options =====
    /// Enable TLS connection
    #[arg(long, env = "GORDON_TLS")]
    tls: bool,

    /// Path to CA certificate for server verification
    #[arg(long, env = "GORDON_CA_CERT")]
    ca_cert: Option<PathBuf>,

    /// Path to client certificate (for mTLS)
    #[arg(long, env = "GORDON_CLIENT_CERT", requires = "client_key")]
    client_cert: Option<PathBuf>,

    /// Path to client private key (for mTLS)
    #[arg(long, env = "GORDON_CLIENT_KEY", requires = "client_cert")]
    client_key: Option<PathBuf>,

    /// Skip server certificate verification (INSECURE)
    #[arg(long, short = 'k')]
    insecure: bool,

    /// Server name for TLS SNI (defaults to the address host)
    #[arg(long)]
    server_name: Option<String>,

    /// Document address, e.g. //localhost:4444/208b43d9-a95d-476d-ba3b-3b64fda2507b
    address: Address,
}

impl Cli {
    fn tls_config(&self) -> Option<TlsClientConfig> {
        if !(self.tls || self.ca_cert.is_some() || self.client_cert.is_some() || self.insecure) {
            return None;
        }

        let mut tls = TlsClientConfig::new();
        tls.ca_cert_path = self.ca_cert.clone();
        tls.client_cert_path = self.client_cert.clone();
        tls.client_key_path = self.client_key.clone();
        tls.insecure = self.insecure;
        tls.server_name = self.server_name.clone();
        Some(tls)
    }

    fn connection_config(&self) -> ConnectionConfig {
        let timeout = Duration::from_secs(self.timeout);
        let mut config = ConnectionConfig::new(self.address.server())
            .with_connect_timeout(timeout)
            .with_request_timeout(timeout);
        if let Some(tls) = self.tls_config() {
            config = config.with_tls(tls);
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = Client::new(cli.connection_config());

    let page = match client.fetch(cli.verb, &cli.address).await {
        Ok(page) => page,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&page) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", render::page(&page));
    }

    if page.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
