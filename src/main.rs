//! CSP nonce injection proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │               CSP NONCE PROXY                │
//!     Client Request      │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ rewriter │───▶│upstream │──┼───▶ Origin
//!                         │  │ server  │    │ (nonce)  │    │ client  │  │
//!     Client Response     │  └─────────┘    └──────────┘    └─────────┘  │
//!     ◀───────────────────┼── CSP header set, HTML nonce="..." rewritten ◀┼──── Response
//!                         │                                              │
//!                         │  config · observability · lifecycle          │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use csp_nonce_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use csp_nonce_proxy::observability::{logging, metrics};
use csp_nonce_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "csp-nonce-proxy")]
#[command(about = "Reverse proxy that injects a fresh CSP nonce into every response", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override upstream.origin.
    #[arg(short, long)]
    upstream: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(origin) = self.upstream {
            config.upstream.origin = origin;
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability);
    tracing::info!("csp-nonce-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %config.upstream.origin,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics exporter");
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
