//! Lookup and update of one indexed entity through the collaborator ports,
//! composed with the poller.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::domain::errors::{PredicateError, VerifyError, VerifyResult};
use crate::domain::models::{Named, PollOutcome, Verdict};
use crate::domain::ports::{EntityWriter, SnapshotSource};
use crate::services::lookup::find_unique_by_index;
use crate::services::poller::Poller;

/// Read `collection` once and resolve the entity in `index`.
pub async fn unique_by_index<E, S, F>(
    source: &S,
    collection: &str,
    index: usize,
    index_of: F,
) -> VerifyResult<E>
where
    E: Named + Clone,
    S: SnapshotSource<E> + ?Sized,
    F: Fn(&str) -> Option<usize>,
{
    let snapshot = source.list(collection).await?;
    find_unique_by_index(&snapshot, index, index_of)
}

/// Poll `collection` until exactly one entity sits in `index`.
///
/// A missing entity or a failed read means "not yet"; an ambiguous index
/// stops polling immediately.
pub async fn eventually_unique_by_index<E, S, F>(
    poller: &Poller,
    source: &S,
    collection: &str,
    index: usize,
    index_of: F,
    timeout: Duration,
) -> VerifyResult<E>
where
    E: Named + Clone,
    S: SnapshotSource<E> + ?Sized,
    F: Fn(&str) -> Option<usize>,
{
    let found: Mutex<Option<VerifyResult<E>>> = Mutex::new(None);
    let slot = &found;
    let index_of = &index_of;

    let outcome = poller
        .poll_until_true(timeout, move |_| async move {
            match unique_by_index(source, collection, index, index_of).await {
                Ok(entity) => {
                    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Ok(entity));
                    Ok(true)
                }
                Err(err) if err.is_not_found() => Ok(false),
                Err(VerifyError::Access(err)) if err.is_retriable() => {
                    Err(PredicateError::from(err))
                }
                Err(err) => {
                    let message = err.to_string();
                    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Err(err));
                    Err(PredicateError::fatal(message))
                }
            }
        })
        .await;

    finish(outcome, index, found)
}

/// Apply `mutate` to a copy of the entity in `index` and write it back,
/// retrying the write until it is accepted.
///
/// The entity must exist exactly once when called; that lookup is not
/// retried. Conflicts and unavailability are retried until `timeout`, a
/// rejected write fails at once. Returns the snapshot as it was before the
/// mutation so callers can restore it later.
#[allow(clippy::too_many_arguments)]
pub async fn update_unique_by_index<E, S, W, F, M>(
    poller: &Poller,
    source: &S,
    writer: &W,
    collection: &str,
    index: usize,
    index_of: F,
    mutate: M,
    timeout: Duration,
) -> VerifyResult<E>
where
    E: Named + Clone + Send + Sync,
    S: SnapshotSource<E> + ?Sized,
    W: EntityWriter<E> + ?Sized,
    F: Fn(&str) -> Option<usize>,
    M: FnOnce(&mut E),
{
    let original = unique_by_index(source, collection, index, index_of).await?;

    let mut updated = original.clone();
    mutate(&mut updated);

    tracing::info!(
        collection,
        index,
        entity = updated.name(),
        "Updating entity"
    );

    let updated = &updated;
    let outcome = poller
        .poll_until_true(timeout, move |_| async move {
            match writer.update(updated).await {
                Ok(()) => Ok(Verdict::Satisfied),
                Err(err) => Err(PredicateError::from(err)),
            }
        })
        .await;

    outcome.into_result()?;
    Ok(original)
}

fn finish<E>(
    outcome: PollOutcome,
    index: usize,
    found: Mutex<Option<VerifyResult<E>>>,
) -> VerifyResult<E> {
    let recorded = found.into_inner().unwrap_or_else(PoisonError::into_inner);
    match recorded {
        // A fatal lookup error keeps its own variant rather than the poller's wrapping.
        Some(Err(err)) => Err(err),
        Some(Ok(entity)) if outcome.is_success() => Ok(entity),
        _ => Err(outcome
            .into_result()
            .err()
            .unwrap_or(VerifyError::NotFound { index })),
    }
}
