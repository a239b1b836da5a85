use thiserror::Error;

/// Failures reported by the orchestrator collaborators
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Collection not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl AccessError {
    /// Whether the same request might succeed if issued again later
    pub const fn is_retriable(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rejections_are_final() {
        assert!(AccessError::Unavailable("timeout".into()).is_retriable());
        assert!(AccessError::Conflict("resourceVersion changed".into()).is_retriable());
        assert!(AccessError::NotFound("machines".into()).is_retriable());
        assert!(!AccessError::Rejected("forbidden".into()).is_retriable());
    }
}
