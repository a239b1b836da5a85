//! Shared, cancellable, time-bounded token handed to every verification task
//! of one supervisor run.
//!
//! Cancellation is one-way: the first recorded [`CancelCause`] wins and every
//! later `cancel` call is a no-op, so siblings may race to cancel without
//! coordinating.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Why a [`DeadlineContext`] was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelCause {
    /// The shared deadline elapsed.
    Deadline,
    /// A verification task reported a definitive failure.
    TaskFailed { label: String, reason: String },
    /// The caller cancelled from outside the group.
    External,
}

/// Roughly 30 years; the furthest a deadline is placed.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + offset`, saturating to [`FAR_FUTURE`] instead of overflowing.
pub(crate) fn instant_after(now: Instant, offset: Duration) -> Instant {
    now.checked_add(offset.min(FAR_FUTURE))
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

#[derive(Debug)]
struct Inner {
    token: CancellationToken,
    deadline: Instant,
    cause: OnceLock<CancelCause>,
}

/// Cheaply clonable handle; all clones observe the same cancellation.
#[derive(Debug, Clone)]
pub struct DeadlineContext {
    inner: Arc<Inner>,
}

impl DeadlineContext {
    /// Context expiring at `deadline`.
    pub fn new(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                deadline,
                cause: OnceLock::new(),
            }),
        }
    }

    /// Context expiring `timeout` after `now`.
    ///
    /// Timeouts too large to represent saturate to a far-future deadline.
    pub fn with_timeout(now: Instant, timeout: Duration) -> Self {
        Self::new(instant_after(now, timeout))
    }

    pub fn deadline(&self) -> Instant {
        self.inner.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.inner.deadline.saturating_duration_since(now)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.inner.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Resolves once the context has been cancelled for any reason.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.token.cancelled()
    }

    /// Cancel with `cause`.
    ///
    /// Returns `true` only for the call whose cause was recorded.
    pub fn cancel(&self, cause: CancelCause) -> bool {
        // Record before waking observers so they always see a cause.
        let recorded = self.inner.cause.set(cause).is_ok();
        self.inner.token.cancel();
        recorded
    }

    /// Cancel because the task `label` failed definitively.
    pub fn fail(&self, label: impl Into<String>, reason: impl Into<String>) -> bool {
        self.cancel(CancelCause::TaskFailed {
            label: label.into(),
            reason: reason.into(),
        })
    }

    pub fn cause(&self) -> Option<&CancelCause> {
        self.inner.cause.get()
    }

    /// Whether cancellation came from the deadline rather than a failure.
    pub fn timed_out(&self) -> bool {
        matches!(self.cause(), Some(CancelCause::Deadline))
    }

    /// A token that is cancelled together with this context.
    pub fn token(&self) -> CancellationToken {
        self.inner.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_cause_wins() {
        let ctx = DeadlineContext::with_timeout(Instant::now(), Duration::from_secs(30));
        assert!(ctx.cause().is_none());

        assert!(ctx.fail("replicas", "exceeded surge capacity"));
        assert!(!ctx.fail("rollout", "machine deleted"));
        assert!(!ctx.cancel(CancelCause::Deadline));

        assert!(ctx.is_cancelled());
        assert_eq!(
            ctx.cause(),
            Some(&CancelCause::TaskFailed {
                label: "replicas".to_string(),
                reason: "exceeded surge capacity".to_string(),
            })
        );
        assert!(!ctx.timed_out());
    }

    #[tokio::test]
    async fn test_clones_share_cancellation() {
        let ctx = DeadlineContext::with_timeout(Instant::now(), Duration::from_secs(1));
        let clone = ctx.clone();

        clone.cancel(CancelCause::Deadline);

        // Already cancelled, so this resolves immediately.
        ctx.cancelled().await;
        assert!(ctx.timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_saturates() {
        let now = Instant::now();
        let ctx = DeadlineContext::with_timeout(now, Duration::from_secs(2));

        assert_eq!(ctx.remaining(now), Duration::from_secs(2));
        assert!(!ctx.is_expired(now));

        let later = now + Duration::from_secs(5);
        assert_eq!(ctx.remaining(later), Duration::ZERO);
        assert!(ctx.is_expired(later));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cancels_do_not_corrupt() {
        let ctx = DeadlineContext::with_timeout(Instant::now(), Duration::from_secs(30));

        let mut handles = Vec::new();
        for i in 0..16 {
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move { ctx.fail(format!("task-{i}"), "boom") }));
        }

        let mut recorded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                recorded += 1;
            }
        }

        assert_eq!(recorded, 1);
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.cause(), Some(CancelCause::TaskFailed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_timeout_saturates() {
        let now = Instant::now();
        let ctx = DeadlineContext::with_timeout(now, Duration::MAX);

        assert_eq!(ctx.deadline(), now + FAR_FUTURE);
        assert!(!ctx.is_expired(now + Duration::from_secs(86_400 * 365)));
    }
}
