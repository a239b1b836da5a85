//! Outcome types returned by the poller and the supervisor.

use std::time::Duration;

use crate::domain::errors::{PredicateError, VerifyError, VerifyResult};

/// Why polling stopped on a failure rather than a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The predicate returned [`Verdict::Failed`](super::Verdict::Failed).
    Verdict(String),
    /// The predicate errored in a way the error policy classifies as fatal.
    Fatal(PredicateError),
}

impl FailureReason {
    pub fn describe(&self) -> String {
        match self {
            Self::Verdict(reason) => reason.clone(),
            Self::Fatal(err) => format!("fatal predicate error: {err}"),
        }
    }
}

/// Outcome of an until-true poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Success {
        elapsed: Duration,
        attempts: u32,
    },
    TimedOut {
        elapsed: Duration,
        attempts: u32,
        /// Message of the last transient error, if the final attempts errored.
        last_error: Option<String>,
    },
    Cancelled {
        elapsed: Duration,
        attempts: u32,
    },
    Failed {
        elapsed: Duration,
        attempts: u32,
        reason: FailureReason,
    },
}

impl PollOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Success { elapsed, .. }
            | Self::TimedOut { elapsed, .. }
            | Self::Cancelled { elapsed, .. }
            | Self::Failed { elapsed, .. } => *elapsed,
        }
    }

    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::TimedOut { attempts, .. }
            | Self::Cancelled { attempts, .. }
            | Self::Failed { attempts, .. } => *attempts,
        }
    }

    /// Convert into the error taxonomy, returning elapsed time on success.
    pub fn into_result(self) -> VerifyResult<Duration> {
        match self {
            Self::Success { elapsed, .. } => Ok(elapsed),
            Self::TimedOut { elapsed, .. } => Err(VerifyError::Timeout {
                elapsed,
                pending: vec![],
            }),
            Self::Cancelled { elapsed, .. } => Err(VerifyError::Cancelled { elapsed }),
            Self::Failed {
                reason: FailureReason::Fatal(err),
                ..
            } => Err(VerifyError::PredicateEvaluation(err)),
            Self::Failed {
                reason: FailureReason::Verdict(reason),
                elapsed,
                ..
            } => Err(VerifyError::PredicateEvaluation(PredicateError::fatal(
                format!("definitive failure after {elapsed:?}: {reason}"),
            ))),
        }
    }
}

/// Outcome of an invariant-holds poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantOutcome {
    /// The window closed on a true sample and no sample was false.
    Holds { elapsed: Duration, samples: u32 },
    /// The first false sample, `at` after the window started.
    ViolatedAt { at: Duration, samples: u32 },
    /// The context deadline cut the window short.
    TimedOut { elapsed: Duration, samples: u32 },
    Cancelled { elapsed: Duration, samples: u32 },
    /// A fatal predicate error, or an errored sample when the window closed.
    Failed {
        elapsed: Duration,
        samples: u32,
        error: PredicateError,
    },
}

impl InvariantOutcome {
    pub const fn holds(&self) -> bool {
        matches!(self, Self::Holds { .. })
    }

    pub const fn samples(&self) -> u32 {
        match self {
            Self::Holds { samples, .. }
            | Self::ViolatedAt { samples, .. }
            | Self::TimedOut { samples, .. }
            | Self::Cancelled { samples, .. }
            | Self::Failed { samples, .. } => *samples,
        }
    }

    pub fn into_result(self) -> VerifyResult<Duration> {
        match self {
            Self::Holds { elapsed, .. } => Ok(elapsed),
            Self::ViolatedAt { at, .. } => Err(VerifyError::InvariantViolated { at }),
            Self::TimedOut { elapsed, .. } => Err(VerifyError::Timeout {
                elapsed,
                pending: vec![],
            }),
            Self::Cancelled { elapsed, .. } => Err(VerifyError::Cancelled { elapsed }),
            Self::Failed { error, .. } => Err(VerifyError::PredicateEvaluation(error)),
        }
    }
}

/// Terminal state of one verification task inside a supervisor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed(String),
    TimedOut,
    Cancelled,
}

/// Per-task record collected at the completion barrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub label: String,
    pub status: TaskStatus,
    pub elapsed: Duration,
}

/// Aggregate outcome of a supervisor run, produced once after every task returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorResult {
    AllSucceeded {
        elapsed: Duration,
    },
    /// `label` is the first task observed to fail; it cancelled its siblings.
    FailedEarly {
        label: String,
        reason: String,
        elapsed: Duration,
    },
    /// The shared deadline elapsed with `pending` tasks never succeeding.
    TimedOut {
        elapsed: Duration,
        pending: Vec<String>,
    },
}

impl SupervisorResult {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::AllSucceeded { .. })
    }

    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::AllSucceeded { elapsed }
            | Self::FailedEarly { elapsed, .. }
            | Self::TimedOut { elapsed, .. } => *elapsed,
        }
    }

    pub fn into_result(self) -> VerifyResult<Duration> {
        match self {
            Self::AllSucceeded { elapsed } => Ok(elapsed),
            Self::FailedEarly {
                label,
                reason,
                elapsed,
            } => Err(VerifyError::TaskFailed {
                label,
                reason,
                elapsed,
            }),
            Self::TimedOut { elapsed, pending } => Err(VerifyError::Timeout { elapsed, pending }),
        }
    }
}
