//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with one catch-all handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Hand every request to the response rewriter
//! - Log and count failures, then render them as generic responses

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::upstream::HyperUpstream;
use crate::lifecycle::shutdown_signal;
use crate::observability::metrics;
use crate::rewriter::{ResponseKind, ResponseRewriter, Upstream};

/// HTTP server for the nonce-injecting proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that fetches from the configured origin.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let upstream = HyperUpstream::new(&config.upstream)?;
        Ok(Self::with_upstream(config, upstream))
    }

    /// Create a server on top of any fetch implementation.
    pub fn with_upstream<U: Upstream>(config: ProxyConfig, upstream: U) -> Self {
        let rewriter = Arc::new(ResponseRewriter::from_config(upstream, &config.rewriter));
        let router = Self::build_router(&config, rewriter);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// A request that outlives `timeouts.request_secs` is answered with
    /// 504 Gateway Timeout.
    fn build_router<U: Upstream>(config: &ProxyConfig, rewriter: Arc<ResponseRewriter<U>>) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler::<U>))
            .route("/", any(proxy_handler::<U>))
            .with_state(rewriter)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until an OS signal or `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.config.upstream.origin,
            "HTTP server starting"
        );

        let requested = async move {
            match shutdown.recv().await {
                Ok(()) => tracing::info!("Shutdown requested"),
                // Trigger dropped: only OS signals remain.
                Err(_) => std::future::pending::<()>().await,
            }
        };

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {},
                    _ = requested => {},
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method and path goes through the rewriter.
async fn proxy_handler<U: Upstream>(
    State(rewriter): State<Arc<ResponseRewriter<U>>>,
    request: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    let start_time = Instant::now();
    let request_id = request.request_id().to_owned();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Proxying request"
    );

    match rewriter.handle(request).await {
        Ok(response) => {
            let kind = ResponseKind::classify(response.status(), response.headers());
            metrics::record_request(method.as_str(), response.status().as_u16(), kind.as_str(), start_time);
            tracing::debug!(
                request_id = %request_id,
                status = %response.status(),
                kind = kind.as_str(),
                "Response rewritten"
            );
            Ok(response)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Request failed");
            metrics::record_error(e.kind());
            metrics::record_request(method.as_str(), e.status_code().as_u16(), "error", start_time);
            Err(e)
        }
    }
}
