use futures::future::BoxFuture;
use tokio::time::Instant;

/// Monotonic clock and sleep primitive used by the poller
///
/// `Instant` is tokio's, so the tokio-backed implementation follows paused
/// virtual time in tests.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current monotonic instant
    fn now(&self) -> Instant;

    /// Resolve once `deadline` has been reached
    fn sleep_until(&self, deadline: Instant) -> BoxFuture<'static, ()>;
}
