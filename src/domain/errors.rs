//! Domain errors for convergence verification.

use std::time::Duration;

use thiserror::Error;

use crate::domain::ports::errors::AccessError;

/// Format the pending task labels carried by a timeout, if any.
fn format_pending(pending: &[String]) -> String {
    if pending.is_empty() {
        String::new()
    } else {
        format!(" (pending: {})", pending.join(", "))
    }
}

/// Errors surfaced by the poller, the lookup and the supervisor.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("more than one entity in index {index}: {first} and {second}")]
    AmbiguousIndex {
        index: usize,
        first: String,
        second: String,
    },

    #[error("no entity found in index {index}")]
    NotFound { index: usize },

    #[error("timed out after {elapsed:?}{}", format_pending(.pending))]
    Timeout {
        elapsed: Duration,
        pending: Vec<String>,
    },

    #[error("verification task '{label}' failed after {elapsed:?}: {reason}")]
    TaskFailed {
        label: String,
        reason: String,
        elapsed: Duration,
    },

    #[error("invariant violated at {at:?}")]
    InvariantViolated { at: Duration },

    #[error("cancelled after {elapsed:?}")]
    Cancelled { elapsed: Duration },

    #[error("predicate evaluation failed: {0}")]
    PredicateEvaluation(#[from] PredicateError),

    #[error("collaborator access failed: {0}")]
    Access(#[from] AccessError),
}

impl VerifyError {
    /// `NotFound` is the one lookup outcome that means "not yet" rather than "broken".
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type VerifyResult<T> = Result<T, VerifyError>;

/// A predicate could not be evaluated.
///
/// Transient errors are retried on the next tick; fatal ones stop polling at
/// once. Whether an error is fatal is decided by its constructor and by the
/// poller's [`ErrorPolicy`](crate::services::poller::ErrorPolicy).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct PredicateError {
    message: String,
    fatal: bool,
}

impl PredicateError {
    /// An error worth retrying on the next tick.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: false,
        }
    }

    /// An error that no amount of retrying will fix.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: true,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_fatal(&self) -> bool {
        self.fatal
    }
}

impl From<AccessError> for PredicateError {
    fn from(err: AccessError) -> Self {
        if err.is_retriable() {
            Self::transient(err.to_string())
        } else {
            Self::fatal(err.to_string())
        }
    }
}

impl From<VerifyError> for PredicateError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::NotFound { .. } => Self::transient(err.to_string()),
            VerifyError::Access(access) => access.into(),
            VerifyError::PredicateEvaluation(inner) => inner,
            other => Self::fatal(other.to_string()),
        }
    }
}
