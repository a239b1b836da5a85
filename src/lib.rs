//! Convergent - bounded verification of orchestrator convergence
//!
//! Convergent checks that state managed by a distributed orchestrator reaches,
//! or stays within, an expected condition inside a bounded time window, across
//! several concurrently evolving signals.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): deadline contexts, verification tasks,
//!   outcomes, errors and the collaborator ports
//! - **Service Layer** (`services`): the bounded poller, the indexed unique
//!   lookup, the concurrent verification supervisor and operations composed
//!   from them
//! - **Infrastructure Layer** (`infrastructure`): tokio clock, configuration
//!   loading and logging
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use convergent::{Poller, Supervisor, SupervisorResult, VerificationTask};
//!
//! # async fn example() {
//! let supervisor = Supervisor::new(Poller::new(Duration::from_secs(5)), Duration::from_secs(1800));
//!
//! let result = supervisor
//!     .run(vec![
//!         VerificationTask::converge("desired replicas", |_ctx| async { Ok(true) }),
//!         VerificationTask::watch("surge capacity", |_ctx| async { Ok(true) }),
//!     ])
//!     .await;
//!
//! assert!(matches!(result, SupervisorResult::AllSucceeded { .. }));
//! # }
//! ```

pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{PredicateError, VerifyError, VerifyResult};
pub use domain::models::{
    exact_suffix_index, suffix_index, CancelCause, Config, DeadlineContext, FailureReason,
    HoldFor, InvariantOutcome, LogConfig, Named, PollConfig, PollOutcome, StabilityConfig,
    SupervisorConfig, SupervisorResult, TaskReport, TaskStatus, Verdict, VerificationTask,
};
pub use domain::ports::{AccessError, Clock, EntityWriter, SnapshotSource, StabilityCheck};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::logging::LoggerImpl;
pub use infrastructure::TokioClock;
pub use services::{
    await_stability, ensure_steady, eventually_unique_by_index, find_unique_by_index,
    update_unique_by_index, ErrorPolicy, Poller, Supervisor,
};
