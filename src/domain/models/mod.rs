//! Domain models for convergence verification

pub mod config;
pub mod deadline;
pub mod entity;
pub mod outcome;
pub mod task;

pub use config::{
    Config, LogConfig, PollConfig, RotationPolicy, StabilityConfig, SupervisorConfig,
};
pub use deadline::{CancelCause, DeadlineContext};
pub use entity::{exact_suffix_index, suffix_index, Named};
pub use outcome::{
    FailureReason, InvariantOutcome, PollOutcome, SupervisorResult, TaskReport, TaskStatus,
};
pub use task::{HoldFor, Verdict, VerificationTask};
