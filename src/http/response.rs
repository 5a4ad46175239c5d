//! Mapping of request-path failures to client responses.
//!
//! Clients get a generic status line and reason text. The underlying error is
//! logged by the handler together with the request ID and never echoed.

use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn upstream_errors_render_bad_gateway_without_detail() {
        let response = ProxyError::Upstream("dial tcp 10.0.0.1:80: refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Bad Gateway");
    }

    #[test]
    fn policy_errors_render_internal_error() {
        let err = axum::http::HeaderValue::from_str("bad\nvalue").unwrap_err();
        let response = ProxyError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
