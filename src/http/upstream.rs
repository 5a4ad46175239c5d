//! Upstream fetch over a pooled hyper client.
//!
//! # Responsibilities
//! - Retarget the inbound URI at the configured origin (path and query kept)
//! - Strip hop-by-hop headers in both directions
//! - Ask the origin for an identity-encoded body, as the platform fetch
//!   hands decoded text to its handler
//!
//! Method, end-to-end headers (including `Host`) and the body stream are
//! forwarded as received.

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{
    ACCEPT_ENCODING, CONNECTION, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER,
    TRANSFER_ENCODING, UPGRADE,
};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Response, Uri, Version};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::validation::check_origin;
use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::rewriter::Upstream;

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

static HOP_BY_HOP: [HeaderName; 8] = [
    CONNECTION,
    KEEP_ALIVE,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// Forwards requests to a single HTTP origin.
#[derive(Clone)]
pub struct HyperUpstream {
    client: Client<HttpConnector, Body>,
    scheme: Scheme,
    authority: Authority,
}

impl HyperUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        check_origin(&config.origin)
            .map_err(|reason| ProxyError::UpstreamUri(format!("{}: {}", config.origin, reason)))?;
        let origin: Uri = config
            .origin
            .parse()
            .map_err(|e| ProxyError::UpstreamUri(format!("{}: {}", config.origin, e)))?;
        let (scheme, authority) = match (origin.scheme(), origin.authority()) {
            (Some(scheme), Some(authority)) => (scheme.clone(), authority.clone()),
            _ => return Err(ProxyError::UpstreamUri(config.origin.clone())),
        };

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            scheme,
            authority,
        })
    }

    /// Origin URI for an inbound request URI.
    pub fn target_uri(&self, uri: &Uri) -> Result<Uri, ProxyError> {
        let path_and_query = uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| ProxyError::UpstreamUri(e.to_string()))
    }
}

impl Upstream for HyperUpstream {
    async fn fetch(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let (mut parts, body) = request.into_parts();
        parts.uri = self.target_uri(&parts.uri)?;
        // Inbound h2 is forwarded over the HTTP/1.1 connection pool.
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        parts
            .headers
            .insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

        tracing::trace!(uri = %parts.uri, method = %parts.method, "Forwarding to origin");

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| ProxyError::Upstream(Box::new(e)))?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(origin: &str) -> Result<HyperUpstream, ProxyError> {
        HyperUpstream::new(&UpstreamConfig {
            origin: origin.to_string(),
            connect_timeout_secs: 1,
        })
    }

    #[tokio::test]
    async fn target_uri_keeps_path_and_query() {
        let upstream = upstream("http://10.1.2.3:8000").unwrap();

        let uri: Uri = "/assets/app.js?v=3".parse().unwrap();
        assert_eq!(
            upstream.target_uri(&uri).unwrap(),
            "http://10.1.2.3:8000/assets/app.js?v=3"
        );

        let absolute: Uri = "http://public.example.com/".parse().unwrap();
        assert_eq!(upstream.target_uri(&absolute).unwrap(), "http://10.1.2.3:8000/");
    }

    #[tokio::test]
    async fn rejects_non_http_origins() {
        assert!(matches!(
            upstream("https://origin.example.com"),
            Err(ProxyError::UpstreamUri(_))
        ));
        assert!(matches!(upstream("origin:80"), Err(ProxyError::UpstreamUri(_))));
    }

    #[test]
    fn strips_hop_by_hop_and_connection_named_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close, x-session-hint"));
        headers.insert("x-session-hint", HeaderValue::from_static("1"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("content-type", HeaderValue::from_static("text/html"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers["content-type"], "text/html");
    }
}
