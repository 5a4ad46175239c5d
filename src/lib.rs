//! Per-request CSP nonce injection proxy.
//!
//! Fetches each request from a single origin, generates a fresh nonce, sets a
//! nonce-scoped `Content-Security-Policy` and rewrites `nonce="..."`
//! attributes in HTML bodies.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewriter;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
