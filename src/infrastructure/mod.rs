//! Infrastructure layer module
//!
//! Adapters and process-level setup:
//! - Tokio clock satisfying the `Clock` port
//! - Configuration management
//! - Logging infrastructure

pub mod clock;
pub mod config;
pub mod logging;

pub use clock::TokioClock;
