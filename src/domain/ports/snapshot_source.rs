use crate::domain::ports::errors::AccessError;
use async_trait::async_trait;

/// Read accessor for a named collection of entities
///
/// Implementations must return value copies, never handles into live
/// orchestrator state, so concurrent verification tasks cannot race on it.
#[async_trait]
pub trait SnapshotSource<E>: Send + Sync {
    /// Current snapshot of the collection
    async fn list(&self, collection: &str) -> Result<Vec<E>, AccessError>;
}
