use crate::domain::ports::errors::AccessError;
use async_trait::async_trait;

/// Write accessor applying an updated entity back to the orchestrator
#[async_trait]
pub trait EntityWriter<E>: Send + Sync {
    /// Persist `entity`, replacing the stored version with the same name
    async fn update(&self, entity: &E) -> Result<(), AccessError>;
}
