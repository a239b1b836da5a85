//! Resolve exactly one entity from a snapshot by its derived positional index.

use crate::domain::errors::{VerifyError, VerifyResult};
use crate::domain::models::Named;

/// Find the single entity in `collection` whose name maps to `index`.
///
/// Entities for which `index_of` returns `None` are skipped. A second match
/// fails the lookup straight away with [`VerifyError::AmbiguousIndex`] naming
/// both entities in scan order; no match is [`VerifyError::NotFound`], which
/// callers may retry through the poller. The returned entity is a copy.
pub fn find_unique_by_index<E, F>(collection: &[E], index: usize, index_of: F) -> VerifyResult<E>
where
    E: Named + Clone,
    F: Fn(&str) -> Option<usize>,
{
    let mut found: Option<&E> = None;

    for entity in collection {
        if index_of(entity.name()) != Some(index) {
            continue;
        }

        if let Some(first) = found {
            tracing::warn!(
                index,
                first = first.name(),
                second = entity.name(),
                "More than one entity in index"
            );
            return Err(VerifyError::AmbiguousIndex {
                index,
                first: first.name().to_string(),
                second: entity.name().to_string(),
            });
        }

        found = Some(entity);
    }

    found.cloned().ok_or(VerifyError::NotFound { index })
}
