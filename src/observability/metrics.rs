//! Metrics collection and exposition.
//!
//! # Metrics
//! - `csp_proxy_requests_total` (counter): requests by method, status, kind
//! - `csp_proxy_request_duration_seconds` (histogram): latency by kind
//! - `csp_proxy_nonce_replacements_total` (counter): rewritten HTML attributes
//! - `csp_proxy_errors_total` (counter): failed requests by error kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, kind: &'static str, start: Instant) {
    metrics::counter!(
        "csp_proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "kind" => kind
    )
    .increment(1);
    metrics::histogram!("csp_proxy_request_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_nonce_replacements(count: usize) {
    metrics::counter!("csp_proxy_nonce_replacements_total").increment(count as u64);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!("csp_proxy_errors_total", "kind" => kind).increment(1);
}
