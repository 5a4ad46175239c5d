//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → request.rs (assign / propagate X-Request-ID)
//!     → rewriter (fetch via upstream.rs, inject nonce)
//!     → response.rs (errors → generic status responses)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
pub use upstream::HyperUpstream;
