use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

use crate::domain::errors::PredicateError;
use crate::domain::models::deadline::DeadlineContext;

/// Result of one predicate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The condition holds.
    Satisfied,
    /// Not yet; evaluate again on the next tick.
    Pending,
    /// The condition can no longer be met. Polling stops at once.
    Failed(String),
}

impl Verdict {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

impl From<bool> for Verdict {
    fn from(value: bool) -> Self {
        if value {
            Self::Satisfied
        } else {
            Self::Pending
        }
    }
}

pub(crate) type ConvergePredicate =
    Box<dyn FnMut(DeadlineContext) -> BoxFuture<'static, Result<Verdict, PredicateError>> + Send>;

pub(crate) type InvariantPredicate =
    Box<dyn FnMut(DeadlineContext) -> BoxFuture<'static, Result<bool, PredicateError>> + Send>;

/// How long an invariant task has to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldFor {
    /// A fixed window starting when the task starts.
    Window(Duration),
    /// Until every converging sibling has succeeded.
    UntilSettled,
}

pub(crate) enum TaskKind {
    Converge(ConvergePredicate),
    Invariant { hold: HoldFor, predicate: InvariantPredicate },
}

/// One labelled check submitted to the [`Supervisor`](crate::services::Supervisor).
pub struct VerificationTask {
    pub(crate) label: String,
    pub(crate) kind: TaskKind,
}

impl VerificationTask {
    /// A check that must eventually become true before the shared deadline.
    ///
    /// Returning [`Verdict::Failed`] aborts the whole group.
    pub fn converge<F, Fut, V>(label: impl Into<String>, mut predicate: F) -> Self
    where
        F: FnMut(DeadlineContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, PredicateError>> + Send + 'static,
        V: Into<Verdict>,
    {
        Self {
            label: label.into(),
            kind: TaskKind::Converge(Box::new(move |ctx| {
                predicate(ctx).map(|res| res.map(Into::into)).boxed()
            })),
        }
    }

    /// A check that must stay true for `window`; the first false sample aborts the group.
    pub fn invariant<F, Fut>(label: impl Into<String>, window: Duration, predicate: F) -> Self
    where
        F: FnMut(DeadlineContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<bool, PredicateError>> + Send + 'static,
    {
        Self::holding(label, HoldFor::Window(window), predicate)
    }

    /// A check that must stay true until every `converge` task in the group succeeded.
    pub fn watch<F, Fut>(label: impl Into<String>, predicate: F) -> Self
    where
        F: FnMut(DeadlineContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<bool, PredicateError>> + Send + 'static,
    {
        Self::holding(label, HoldFor::UntilSettled, predicate)
    }

    fn holding<F, Fut>(label: impl Into<String>, hold: HoldFor, mut predicate: F) -> Self
    where
        F: FnMut(DeadlineContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<bool, PredicateError>> + Send + 'static,
    {
        Self {
            label: label.into(),
            kind: TaskKind::Invariant {
                hold,
                predicate: Box::new(move |ctx| predicate(ctx).boxed()),
            },
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub const fn is_converging(&self) -> bool {
        matches!(self.kind, TaskKind::Converge(_))
    }
}

impl fmt::Debug for VerificationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            TaskKind::Converge(_) => "converge".to_string(),
            TaskKind::Invariant { hold, .. } => format!("invariant({hold:?})"),
        };
        f.debug_struct("VerificationTask")
            .field("label", &self.label)
            .field("kind", &kind)
            .finish()
    }
}
