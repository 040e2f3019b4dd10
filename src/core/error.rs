use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Note '{0}' is no longer present")]
    StaleEntity(String),

    #[error("Session already stopped")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// True for failures that the next reconciliation fetch retries
    /// implicitly, as opposed to errors the caller must correct.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
