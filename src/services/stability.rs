//! Waiting for, and asserting, a settled managed system.

use std::time::Duration;

use crate::domain::errors::{PredicateError, VerifyResult};
use crate::domain::models::StabilityConfig;
use crate::domain::ports::StabilityCheck;
use crate::services::poller::Poller;

/// Poll `check` until it reports a stable system.
pub async fn await_stability<C>(poller: &Poller, check: &C, timeout: Duration) -> VerifyResult<Duration>
where
    C: StabilityCheck + ?Sized,
{
    tracing::info!(timeout_secs = timeout.as_secs(), "Waiting for the system to stabilise");
    poller
        .poll_until_true(timeout, move |_| async move {
            check.is_stable().await.map_err(PredicateError::from)
        })
        .await
        .into_result()
}

/// [`await_stability`] on the cadence and timeout from `config`.
pub async fn await_stability_with<C>(config: &StabilityConfig, check: &C) -> VerifyResult<Duration>
where
    C: StabilityCheck + ?Sized,
{
    let poller = Poller::new(config.interval());
    await_stability(&poller, check, config.timeout()).await
}

/// Assert `check` keeps reporting a stable system for all of `window`.
pub async fn ensure_steady<C>(poller: &Poller, check: &C, window: Duration) -> VerifyResult<Duration>
where
    C: StabilityCheck + ?Sized,
{
    poller
        .poll_invariant_holds(window, move |_| async move {
            check.is_stable().await.map_err(PredicateError::from)
        })
        .await
        .into_result()
}
