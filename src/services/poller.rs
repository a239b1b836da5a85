//! Bounded polling of caller-supplied predicates.
//!
//! Two evaluation modes share one cadence:
//! - until-true: stop at the first satisfied evaluation, or at the deadline
//! - invariant-holds: stop at the first false evaluation, or when the window closes
//!
//! Both evaluate immediately, clamp their last sleep to the deadline so the
//! final evaluation lands exactly on it, and wake early when the deadline
//! context is cancelled.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::PredicateError;
use crate::domain::models::deadline::instant_after;
use crate::domain::models::{
    DeadlineContext, FailureReason, InvariantOutcome, PollConfig, PollOutcome, Verdict,
};
use crate::domain::ports::Clock;
use crate::infrastructure::clock::TokioClock;

/// Shortest interval the poller will sleep between evaluations.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Decides which predicate errors stop polling.
#[derive(Clone, Default)]
pub enum ErrorPolicy {
    /// Only errors constructed with [`PredicateError::fatal`] stop polling.
    #[default]
    Lenient,
    /// Every error stops polling.
    Strict,
    /// The classifier returns `true` for errors that stop polling.
    /// Errors constructed fatal always stop polling.
    Classify(Arc<dyn Fn(&PredicateError) -> bool + Send + Sync>),
}

impl ErrorPolicy {
    pub fn classify<F>(classifier: F) -> Self
    where
        F: Fn(&PredicateError) -> bool + Send + Sync + 'static,
    {
        Self::Classify(Arc::new(classifier))
    }

    pub fn is_fatal(&self, err: &PredicateError) -> bool {
        match self {
            Self::Lenient => err.is_fatal(),
            Self::Strict => true,
            Self::Classify(classifier) => err.is_fatal() || classifier(err),
        }
    }
}

impl fmt::Debug for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("Lenient"),
            Self::Strict => f.write_str("Strict"),
            Self::Classify(_) => f.write_str("Classify(..)"),
        }
    }
}

/// What ends an invariant hold besides a violation.
#[derive(Clone, Copy)]
enum HoldUntil<'a> {
    Instant(Instant),
    Settled(&'a CancellationToken),
}

/// Stateless polling engine; clone freely.
#[derive(Debug, Clone)]
pub struct Poller {
    clock: Arc<dyn Clock>,
    interval: Duration,
    error_policy: ErrorPolicy,
}

impl Poller {
    /// Poller on the tokio clock evaluating every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(Arc::new(TokioClock), interval)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval: interval.max(MIN_INTERVAL),
            error_policy: ErrorPolicy::default(),
        }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self::new(config.interval())
    }

    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// A fresh deadline context expiring `timeout` from now.
    pub fn context(&self, timeout: Duration) -> DeadlineContext {
        DeadlineContext::with_timeout(self.clock.now(), timeout)
    }

    /// Evaluate `predicate` until it is satisfied or `timeout` elapses.
    pub async fn poll_until_true<F, Fut, V>(&self, timeout: Duration, predicate: F) -> PollOutcome
    where
        F: FnMut(DeadlineContext) -> Fut,
        Fut: Future<Output = Result<V, PredicateError>>,
        V: Into<Verdict>,
    {
        let ctx = self.context(timeout);
        self.poll_until_true_within(&ctx, predicate).await
    }

    /// Evaluate `predicate` until it is satisfied, `ctx` expires or `ctx` is cancelled.
    pub async fn poll_until_true_within<F, Fut, V>(
        &self,
        ctx: &DeadlineContext,
        mut predicate: F,
    ) -> PollOutcome
    where
        F: FnMut(DeadlineContext) -> Fut,
        Fut: Future<Output = Result<V, PredicateError>>,
        V: Into<Verdict>,
    {
        let start = self.clock.now();
        let deadline = ctx.deadline();
        let mut attempts = 0u32;
        let mut last_error: Option<String> = None;

        loop {
            if ctx.is_cancelled() {
                let elapsed = self.clock.now().duration_since(start);
                return if ctx.timed_out() {
                    PollOutcome::TimedOut {
                        elapsed,
                        attempts,
                        last_error,
                    }
                } else {
                    PollOutcome::Cancelled { elapsed, attempts }
                };
            }

            attempts += 1;
            match predicate(ctx.clone()).await.map(Into::<Verdict>::into) {
                Ok(Verdict::Satisfied) => {
                    let elapsed = self.clock.now().duration_since(start);
                    tracing::info!(attempts, elapsed_ms = elapsed.as_millis() as u64, "Predicate satisfied");
                    return PollOutcome::Success { elapsed, attempts };
                }
                Ok(Verdict::Pending) => {
                    tracing::trace!(attempt = attempts, "Predicate not yet satisfied");
                    last_error = None;
                }
                Ok(Verdict::Failed(reason)) => {
                    let elapsed = self.clock.now().duration_since(start);
                    tracing::warn!(attempts, reason = %reason, "Predicate reported definitive failure");
                    return PollOutcome::Failed {
                        elapsed,
                        attempts,
                        reason: FailureReason::Verdict(reason),
                    };
                }
                Err(err) if self.error_policy.is_fatal(&err) => {
                    let elapsed = self.clock.now().duration_since(start);
                    tracing::warn!(attempts, error = %err, "Fatal predicate error");
                    return PollOutcome::Failed {
                        elapsed,
                        attempts,
                        reason: FailureReason::Fatal(err),
                    };
                }
                Err(err) => {
                    tracing::debug!(attempt = attempts, error = %err, "Transient predicate error, retrying");
                    last_error = Some(err.message().to_string());
                }
            }

            let now = self.clock.now();
            if now >= deadline {
                let elapsed = now.duration_since(start);
                tracing::debug!(attempts, elapsed_ms = elapsed.as_millis() as u64, "Poll deadline reached");
                return PollOutcome::TimedOut {
                    elapsed,
                    attempts,
                    last_error,
                };
            }

            let wake = instant_after(now, self.interval).min(deadline);
            tokio::select! {
                () = self.clock.sleep_until(wake) => {}
                () = ctx.cancelled() => {}
            }
        }
    }

    /// Evaluate `predicate` across `duration`, stopping at the first false sample.
    pub async fn poll_invariant_holds<F, Fut>(
        &self,
        duration: Duration,
        predicate: F,
    ) -> InvariantOutcome
    where
        F: FnMut(DeadlineContext) -> Fut,
        Fut: Future<Output = Result<bool, PredicateError>>,
    {
        let start = self.clock.now();
        let end = instant_after(start, duration);
        let ctx = DeadlineContext::new(end);
        self.hold(&ctx, HoldUntil::Instant(end), predicate).await
    }

    /// Like [`poll_invariant_holds`](Self::poll_invariant_holds) against a
    /// caller-owned context. A window reaching past the context deadline ends
    /// in `TimedOut` at the deadline.
    pub async fn poll_invariant_holds_within<F, Fut>(
        &self,
        ctx: &DeadlineContext,
        duration: Duration,
        predicate: F,
    ) -> InvariantOutcome
    where
        F: FnMut(DeadlineContext) -> Fut,
        Fut: Future<Output = Result<bool, PredicateError>>,
    {
        let end = instant_after(self.clock.now(), duration);
        self.hold(ctx, HoldUntil::Instant(end), predicate).await
    }

    /// Hold `predicate` until `settled` is cancelled; always samples at least once.
    pub(crate) async fn hold_until_settled<F, Fut>(
        &self,
        ctx: &DeadlineContext,
        settled: &CancellationToken,
        predicate: F,
    ) -> InvariantOutcome
    where
        F: FnMut(DeadlineContext) -> Fut,
        Fut: Future<Output = Result<bool, PredicateError>>,
    {
        self.hold(ctx, HoldUntil::Settled(settled), predicate).await
    }

    async fn hold<F, Fut>(
        &self,
        ctx: &DeadlineContext,
        until: HoldUntil<'_>,
        mut predicate: F,
    ) -> InvariantOutcome
    where
        F: FnMut(DeadlineContext) -> Fut,
        Fut: Future<Output = Result<bool, PredicateError>>,
    {
        let start = self.clock.now();
        let deadline = ctx.deadline();
        let mut samples = 0u32;
        // Set while the most recent sample errored; a window cannot close on it.
        let mut unconfirmed: Option<PredicateError> = None;

        loop {
            if ctx.is_cancelled() {
                let elapsed = self.clock.now().duration_since(start);
                return if ctx.timed_out() {
                    InvariantOutcome::TimedOut { elapsed, samples }
                } else {
                    InvariantOutcome::Cancelled { elapsed, samples }
                };
            }

            let sampled_at = self.clock.now();
            samples += 1;
            match predicate(ctx.clone()).await {
                Ok(true) => unconfirmed = None,
                Ok(false) => {
                    let at = sampled_at.duration_since(start);
                    tracing::warn!(samples, at_ms = at.as_millis() as u64, "Invariant violated");
                    return InvariantOutcome::ViolatedAt { at, samples };
                }
                Err(err) if self.error_policy.is_fatal(&err) => {
                    let elapsed = self.clock.now().duration_since(start);
                    tracing::warn!(samples, error = %err, "Fatal predicate error while holding invariant");
                    return InvariantOutcome::Failed {
                        elapsed,
                        samples,
                        error: err,
                    };
                }
                Err(err) => {
                    tracing::warn!(sample = samples, error = %err, "Invariant sample errored, retrying on next tick");
                    unconfirmed = Some(err);
                }
            }

            let now = self.clock.now();
            let elapsed = now.duration_since(start);
            let closed = match until {
                HoldUntil::Instant(end) => now >= end,
                HoldUntil::Settled(settled) => settled.is_cancelled(),
            };
            if closed {
                if let Some(error) = unconfirmed.take() {
                    tracing::warn!(samples, error = %error, "Invariant window closed on an errored sample");
                    return InvariantOutcome::Failed {
                        elapsed,
                        samples,
                        error,
                    };
                }
                tracing::debug!(samples, elapsed_ms = elapsed.as_millis() as u64, "Invariant held");
                return InvariantOutcome::Holds { elapsed, samples };
            }
            let window_end = match until {
                HoldUntil::Instant(end) => end,
                HoldUntil::Settled(_) => deadline,
            };

            if now >= deadline {
                return InvariantOutcome::TimedOut { elapsed, samples };
            }

            let wake = instant_after(now, self.interval).min(window_end).min(deadline);
            let settled_wait = async {
                match until {
                    HoldUntil::Settled(settled) => settled.cancelled().await,
                    HoldUntil::Instant(_) => std::future::pending().await,
                }
            };
            tokio::select! {
                () = self.clock.sleep_until(wake) => {}
                () = ctx.cancelled() => {}
                () = settled_wait => {}
            }
        }
    }
}
