//! Concurrent verification supervisor.
//!
//! Runs every submitted [`VerificationTask`] as its own tokio task against one
//! shared [`DeadlineContext`]. A task that fails definitively cancels the
//! context, which wakes every sibling on its next poll tick. The supervisor
//! itself cancels the context when the deadline passes. The `JoinSet` is the
//! completion barrier: the result is classified only after every task
//! returned, whatever its outcome.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::domain::models::{
    CancelCause, Config, DeadlineContext, HoldFor, InvariantOutcome, PollOutcome,
    SupervisorResult, TaskReport, TaskStatus, VerificationTask,
};
use crate::domain::models::task::TaskKind;
use crate::services::poller::Poller;

/// Tracks converging tasks still outstanding; the last one to succeed
/// releases `UntilSettled` watchers.
#[derive(Debug, Clone)]
struct Settlement {
    remaining: Arc<AtomicUsize>,
    settled: CancellationToken,
}

impl Settlement {
    fn new(converging: usize) -> Self {
        let settled = CancellationToken::new();
        if converging == 0 {
            settled.cancel();
        }
        Self {
            remaining: Arc::new(AtomicUsize::new(converging)),
            settled,
        }
    }

    fn converged(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.settled.cancel();
        }
    }
}

/// Fans verification tasks out under one deadline and fans their results in.
#[derive(Debug, Clone)]
pub struct Supervisor {
    poller: Poller,
    timeout: Duration,
}

impl Supervisor {
    /// Supervisor whose groups share a `timeout` deadline.
    pub const fn new(poller: Poller, timeout: Duration) -> Self {
        Self { poller, timeout }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Poller::from_config(&config.poll), config.supervisor.timeout())
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    pub const fn poller(&self) -> &Poller {
        &self.poller
    }

    /// Run `tasks` concurrently under the configured timeout.
    pub async fn run(&self, tasks: Vec<VerificationTask>) -> SupervisorResult {
        self.run_concurrently(tasks, self.timeout).await
    }

    /// Run `tasks` concurrently under one shared `timeout`.
    pub async fn run_concurrently(
        &self,
        tasks: Vec<VerificationTask>,
        timeout: Duration,
    ) -> SupervisorResult {
        self.run_with_reports(tasks, timeout).await.0
    }

    /// Like [`run_concurrently`](Self::run_concurrently), also returning the
    /// per-task reports in submission order.
    pub async fn run_with_reports(
        &self,
        tasks: Vec<VerificationTask>,
        timeout: Duration,
    ) -> (SupervisorResult, Vec<TaskReport>) {
        let clock = self.poller.clock().clone();
        let start = clock.now();

        if tasks.is_empty() {
            tracing::debug!("No verification tasks submitted");
            return (SupervisorResult::AllSucceeded { elapsed: Duration::ZERO }, vec![]);
        }

        let ctx = DeadlineContext::with_timeout(start, timeout);
        let settlement = Settlement::new(tasks.iter().filter(|t| t.is_converging()).count());
        let labels: Vec<String> = tasks.iter().map(|t| t.label.clone()).collect();

        tracing::info!(
            task_count = tasks.len(),
            timeout_secs = timeout.as_secs(),
            "Starting concurrent verification"
        );

        let mut set = JoinSet::new();
        let mut positions: HashMap<Id, usize> = HashMap::with_capacity(tasks.len());

        for (position, task) in tasks.into_iter().enumerate() {
            let span = tracing::info_span!("verification_task", label = %task.label);
            let poller = self.poller.clone();
            let ctx = ctx.clone();
            let settlement = settlement.clone();
            let handle = set.spawn(
                async move { run_task(&poller, &ctx, &settlement, task).await }.instrument(span),
            );
            positions.insert(handle.id(), position);
        }

        let mut reports: Vec<Option<TaskReport>> = vec![None; labels.len()];
        let deadline_passed = clock.sleep_until(ctx.deadline());
        tokio::pin!(deadline_passed);

        loop {
            tokio::select! {
                joined = set.join_next_with_id() => {
                    let Some(joined) = joined else { break };
                    match joined {
                        Ok((id, report)) => {
                            if let Some(&position) = positions.get(&id) {
                                reports[position] = Some(report);
                            }
                        }
                        Err(err) => {
                            let Some(&position) = positions.get(&err.id()) else { continue };
                            let label = labels[position].clone();
                            let reason = if err.is_panic() {
                                "verification task panicked".to_string()
                            } else {
                                format!("verification task aborted: {err}")
                            };
                            tracing::error!(label = %label, reason = %reason, "Verification task did not complete");
                            ctx.fail(label.clone(), reason.clone());
                            reports[position] = Some(TaskReport {
                                label,
                                status: TaskStatus::Failed(reason),
                                elapsed: clock.now().duration_since(start),
                            });
                        }
                    }
                }
                () = &mut deadline_passed, if !ctx.is_cancelled() => {
                    tracing::warn!(timeout_secs = timeout.as_secs(), "Shared verification deadline elapsed");
                    ctx.cancel(CancelCause::Deadline);
                }
            }
        }

        let elapsed = clock.now().duration_since(start);
        let reports: Vec<TaskReport> = reports
            .into_iter()
            .zip(labels)
            .map(|(report, label)| {
                report.unwrap_or(TaskReport {
                    label,
                    status: TaskStatus::Cancelled,
                    elapsed,
                })
            })
            .collect();

        let result = classify(&ctx, &reports, elapsed);
        match &result {
            SupervisorResult::AllSucceeded { .. } => {
                tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "All verification tasks succeeded");
            }
            SupervisorResult::FailedEarly { label, reason, .. } => {
                tracing::warn!(label = %label, reason = %reason, elapsed_ms = elapsed.as_millis() as u64, "Verification failed early");
            }
            SupervisorResult::TimedOut { pending, .. } => {
                tracing::warn!(pending = ?pending, elapsed_ms = elapsed.as_millis() as u64, "Verification timed out");
            }
        }

        (result, reports)
    }
}

fn classify(ctx: &DeadlineContext, reports: &[TaskReport], elapsed: Duration) -> SupervisorResult {
    if let Some(CancelCause::TaskFailed { label, reason }) = ctx.cause() {
        return SupervisorResult::FailedEarly {
            label: label.clone(),
            reason: reason.clone(),
            elapsed,
        };
    }

    let pending: Vec<String> = reports
        .iter()
        .filter(|r| r.status != TaskStatus::Succeeded)
        .map(|r| r.label.clone())
        .collect();

    if pending.is_empty() {
        SupervisorResult::AllSucceeded { elapsed }
    } else {
        SupervisorResult::TimedOut { elapsed, pending }
    }
}

async fn run_task(
    poller: &Poller,
    ctx: &DeadlineContext,
    settlement: &Settlement,
    task: VerificationTask,
) -> TaskReport {
    let VerificationTask { label, kind } = task;

    let (status, elapsed) = match kind {
        TaskKind::Converge(mut predicate) => {
            let outcome = poller.poll_until_true_within(ctx, |c| predicate(c)).await;
            let elapsed = outcome.elapsed();
            let status = match outcome {
                PollOutcome::Success { .. } => {
                    settlement.converged();
                    TaskStatus::Succeeded
                }
                PollOutcome::Failed { reason, .. } => {
                    let reason = reason.describe();
                    ctx.fail(label.clone(), reason.clone());
                    TaskStatus::Failed(reason)
                }
                PollOutcome::TimedOut { .. } => TaskStatus::TimedOut,
                PollOutcome::Cancelled { .. } => TaskStatus::Cancelled,
            };
            (status, elapsed)
        }
        TaskKind::Invariant { hold, mut predicate } => {
            let outcome = match hold {
                HoldFor::Window(window) => {
                    poller
                        .poll_invariant_holds_within(ctx, window, |c| predicate(c))
                        .await
                }
                HoldFor::UntilSettled => {
                    poller
                        .hold_until_settled(ctx, &settlement.settled, |c| predicate(c))
                        .await
                }
            };
            match outcome {
                InvariantOutcome::Holds { elapsed, .. } => (TaskStatus::Succeeded, elapsed),
                InvariantOutcome::ViolatedAt { at, .. } => {
                    let reason = format!("invariant violated at {at:?}");
                    ctx.fail(label.clone(), reason.clone());
                    (TaskStatus::Failed(reason), at)
                }
                InvariantOutcome::Failed { elapsed, error, .. } => {
                    let reason = format!("invariant predicate error: {error}");
                    ctx.fail(label.clone(), reason.clone());
                    (TaskStatus::Failed(reason), elapsed)
                }
                InvariantOutcome::TimedOut { elapsed, .. } => (TaskStatus::TimedOut, elapsed),
                InvariantOutcome::Cancelled { elapsed, .. } => (TaskStatus::Cancelled, elapsed),
            }
        }
    };

    tracing::debug!(status = ?status, elapsed_ms = elapsed.as_millis() as u64, "Verification task finished");
    TaskReport {
        label,
        status,
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PredicateError;
    use crate::domain::models::Verdict;
    use tokio::time::Instant;

    fn supervisor() -> Supervisor {
        Supervisor::new(Poller::new(Duration::from_millis(100)), Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_tasks_succeed_immediately() {
        let result = supervisor().run(vec![]).await;
        assert_eq!(result, SupervisorResult::AllSucceeded { elapsed: Duration::ZERO });
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_succeed_when_slowest_succeeds() {
        let start = Instant::now();
        let tasks = vec![
            VerificationTask::converge("fast", move |_| async move {
                Ok(start.elapsed() >= Duration::from_millis(300))
            }),
            VerificationTask::converge("slow", move |_| async move {
                Ok(start.elapsed() >= Duration::from_secs(3))
            }),
        ];

        let (result, reports) = supervisor()
            .run_with_reports(tasks, Duration::from_secs(30))
            .await;

        assert_eq!(result, SupervisorResult::AllSucceeded { elapsed: Duration::from_secs(3) });
        assert_eq!(reports[0].label, "fast");
        assert_eq!(reports[0].elapsed, Duration::from_millis(300));
        assert_eq!(reports[1].status, TaskStatus::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_cancels_siblings() {
        let start = Instant::now();
        let tasks = vec![
            VerificationTask::converge("A", |_| async { Ok(false) }),
            VerificationTask::converge("B", move |_| async move {
                if start.elapsed() >= Duration::from_secs(2) {
                    Ok(Verdict::failed("replicas dropped below desired"))
                } else {
                    Ok(Verdict::Pending)
                }
            }),
            VerificationTask::converge("C", |_| async { Ok(false) }),
        ];

        let (result, reports) = supervisor()
            .run_with_reports(tasks, Duration::from_secs(30))
            .await;

        match result {
            SupervisorResult::FailedEarly {
                label,
                reason,
                elapsed,
            } => {
                assert_eq!(label, "B");
                assert_eq!(reason, "replicas dropped below desired");
                assert_eq!(elapsed, Duration::from_secs(2));
            }
            other => panic!("expected FailedEarly, got {other:?}"),
        }
        assert_eq!(reports[0].status, TaskStatus::Cancelled);
        assert!(matches!(reports[1].status, TaskStatus::Failed(_)));
        assert_eq!(reports[2].status, TaskStatus::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_deadline_times_out_pending_tasks() {
        let tasks = vec![
            VerificationTask::converge("done", |_| async { Ok(true) }),
            VerificationTask::converge("stuck", |_| async { Ok(false) }),
        ];

        let result = supervisor()
            .run_concurrently(tasks, Duration::from_secs(5))
            .await;

        assert_eq!(
            result,
            SupervisorResult::TimedOut {
                elapsed: Duration::from_secs(5),
                pending: vec!["stuck".to_string()],
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_predicate_error_fails_group() {
        let tasks = vec![
            VerificationTask::converge("wait", |_| async { Ok(false) }),
            VerificationTask::converge("read", |_| async {
                Err::<bool, _>(PredicateError::fatal("forbidden"))
            }),
        ];

        let result = supervisor().run(tasks).await;
        assert!(matches!(
            result,
            SupervisorResult::FailedEarly { ref label, .. } if label == "read"
        ));
        assert!(result.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_holds_until_converged() {
        let start = Instant::now();
        let tasks = vec![
            VerificationTask::watch("surge", |_| async { Ok(true) }),
            VerificationTask::converge("rollout", move |_| async move {
                Ok(start.elapsed() >= Duration::from_secs(4))
            }),
        ];

        let (result, reports) = supervisor()
            .run_with_reports(tasks, Duration::from_secs(30))
            .await;

        assert_eq!(result, SupervisorResult::AllSucceeded { elapsed: Duration::from_secs(4) });
        assert_eq!(reports[0].status, TaskStatus::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_violation_fails_group() {
        let start = Instant::now();
        let tasks = vec![
            VerificationTask::watch("surge", move |_| async move {
                Ok(start.elapsed() < Duration::from_secs(1))
            }),
            VerificationTask::converge("rollout", |_| async { Ok(false) }),
        ];

        let result = supervisor().run(tasks).await;
        match result {
            SupervisorResult::FailedEarly { label, reason, elapsed } => {
                assert_eq!(label, "surge");
                assert!(reason.starts_with("invariant violated"));
                assert_eq!(elapsed, Duration::from_secs(1));
            }
            other => panic!("expected FailedEarly, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_task_is_a_failure() {
        let tasks = vec![
            VerificationTask::converge("steady", |_| async { Ok(false) }),
            VerificationTask::converge("broken", |_| async {
                if true {
                    panic!("predicate bug");
                }
                Ok(true)
            }),
        ];

        let (result, reports) = supervisor()
            .run_with_reports(tasks, Duration::from_secs(30))
            .await;

        match result {
            SupervisorResult::FailedEarly { label, reason, .. } => {
                assert_eq!(label, "broken");
                assert_eq!(reason, "verification task panicked");
            }
            other => panic!("expected FailedEarly, got {other:?}"),
        }
        assert_eq!(reports[0].status, TaskStatus::Cancelled);
    }
}
