//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty stdout formatting
//! - Optional rolling JSON file output

pub mod logger;

pub use logger::LoggerImpl;

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, trace, warn};
