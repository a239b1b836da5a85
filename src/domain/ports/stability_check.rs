use crate::domain::ports::errors::AccessError;
use async_trait::async_trait;

/// Opaque probe reporting whether the managed system has settled
#[async_trait]
pub trait StabilityCheck: Send + Sync {
    async fn is_stable(&self) -> Result<bool, AccessError>;
}
