//! Tokio-backed monotonic clock.

use futures::future::{BoxFuture, FutureExt};
use tokio::time::Instant;

use crate::domain::ports::Clock;

/// [`Clock`] on tokio's time driver; follows paused time in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) -> BoxFuture<'static, ()> {
        tokio::time::sleep_until(deadline).boxed()
    }
}
