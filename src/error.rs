//! Request-path error type.
//!
//! Nothing on the request path recovers from a failure: every error bubbles
//! up to the HTTP handler with `?` and is rendered there as a generic failure
//! response (see `http::response`).

use axum::http::header::InvalidHeaderValue;
use axum::http::StatusCode;
use thiserror::Error;

use crate::rewriter::NonceError;

/// Failure while fetching or rewriting a response.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The origin could not be reached or the exchange failed mid-flight.
    #[error("upstream request failed: {0}")]
    Upstream(#[source] tower::BoxError),

    /// The configured origin and the request path do not form a valid URI.
    #[error("invalid upstream uri: {0}")]
    UpstreamUri(String),

    /// The HTML body stream failed or exceeded the buffering limit.
    #[error("failed to read response body: {0}")]
    BodyRead(#[from] axum::Error),

    /// The HTML body is not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    BodyDecode(#[from] std::string::FromUtf8Error),

    /// The rendered policy is not a legal header value.
    #[error("invalid Content-Security-Policy value: {0}")]
    Policy(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Nonce(#[from] NonceError),
}

impl ProxyError {
    /// Status code of the generic response rendered for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(_)
            | ProxyError::UpstreamUri(_)
            | ProxyError::BodyRead(_)
            | ProxyError::BodyDecode(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Policy(_) | ProxyError::Nonce(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Upstream(_) => "upstream",
            ProxyError::UpstreamUri(_) => "upstream_uri",
            ProxyError::BodyRead(_) => "body_read",
            ProxyError::BodyDecode(_) => "body_decode",
            ProxyError::Policy(_) => "policy",
            ProxyError::Nonce(_) => "nonce",
        }
    }
}
