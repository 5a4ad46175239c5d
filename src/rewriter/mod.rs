//! CSP nonce injection.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → upstream.rs (Upstream::fetch, unmodified request)
//!     → nonce.rs (one fresh nonce per request)
//!     → rewrite.rs (clone headers, set/strip CSP, rewrite HTML nonce attributes)
//!     → policy.rs (render the nonce-scoped CSP header value)
//!     → outbound response
//! ```
//!
//! # Design Decisions
//! - The same nonce is used for the header and every attribute in the body
//! - Only `text/html` bodies are buffered; everything else is streamed through
//! - 304 responses carry no CSP so the client keeps its cached policy/nonce pair
//! - No error is handled here; failures propagate to the server

pub mod nonce;
pub mod policy;
pub mod rewrite;
pub mod upstream;

pub use nonce::{generate_nonce, Nonce, NonceError, NONCE_BYTES_LEN};
pub use policy::{CspPolicy, DEFAULT_SCRIPT_ALLOW_ORIGIN};
pub use rewrite::{is_html, replace_nonce_attributes, ResponseKind, ResponseRewriter};
pub use upstream::Upstream;
