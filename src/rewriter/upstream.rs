//! The fetch primitive the rewriter sits on top of.

use std::future::Future;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::error::ProxyError;

/// Something that turns an inbound request into the origin's response.
///
/// The production implementation is `http::upstream::HyperUpstream`; tests
/// substitute canned responses.
pub trait Upstream: Send + Sync + 'static {
    fn fetch(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, ProxyError>> + Send;
}
