//! Configuration schema definitions.
//!
//! Every section has defaults, so an empty file (or no file at all) yields a
//! runnable proxy in front of `http://127.0.0.1:3000`.

use serde::{Deserialize, Serialize};

use crate::rewriter::DEFAULT_SCRIPT_ALLOW_ORIGIN;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Origin the proxy fetches from.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// CSP / nonce rewriting settings.
    pub rewriter: RewriterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Origin server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute `http://host:port` origin; request paths are appended to it.
    pub origin: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:3000".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Response rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriterConfig {
    /// Third-party script origin allowed next to the nonce in `script-src`.
    pub script_allow_origin: String,

    /// Largest HTML body buffered for rewriting, in bytes.
    pub max_html_body_bytes: usize,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            script_allow_origin: DEFAULT_SCRIPT_ALLOW_ORIGIN.to_string(),
            max_html_body_bytes: 16 * 1024 * 1024, // 16MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (overridden by `RUST_LOG`).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
