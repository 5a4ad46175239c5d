//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse CLI → Load config → Validate → Logging/metrics → Bind → Serve
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGINT/SIGTERM or Shutdown::trigger → Stop accepting → Drain in-flight → Exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
