//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, RewriterConfig, TimeoutConfig,
    UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
