//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All problems are
//! collected and returned together rather than stopping at the first.

use std::net::SocketAddr;

use axum::http::Uri;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a host:port address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.origin: '{origin}' {reason}")]
    InvalidOrigin { origin: String, reason: &'static str },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("rewriter.script_allow_origin: '{0}' is not a single CSP source expression")]
    InvalidAllowOrigin(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_host_port(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if let Err(reason) = check_origin(&config.upstream.origin) {
        errors.push(ValidationError::InvalidOrigin {
            origin: config.upstream.origin.clone(),
            reason,
        });
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.connect_timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.rewriter.max_html_body_bytes == 0 {
        errors.push(ValidationError::Zero("rewriter.max_html_body_bytes"));
    }

    let allow = &config.rewriter.script_allow_origin;
    let is_source_expression = !allow.is_empty()
        && allow
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, ';' | ',' | '\''));
    if !is_source_expression {
        errors.push(ValidationError::InvalidAllowOrigin(allow.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// The listener resolves names at bind time, so `localhost:8080` is as
/// acceptable as a literal socket address.
fn is_host_port(value: &str) -> bool {
    if value.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match value.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !host.contains(char::is_whitespace) && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

/// The origin must be `http://authority` with at most a bare `/` path.
pub(crate) fn check_origin(origin: &str) -> Result<(), &'static str> {
    let uri: Uri = origin.parse().map_err(|_| "is not a valid URI")?;

    match uri.scheme_str() {
        Some("http") => {}
        Some(_) => return Err("must use the http scheme"),
        None => return Err("must be absolute"),
    }
    if uri.authority().is_none() {
        return Err("has no host");
    }
    if let Some(pq) = uri.path_and_query() {
        if pq.as_str() != "/" && !pq.as_str().is_empty() {
            return Err("must not carry a path or query");
        }
    }
    Ok(())
}
