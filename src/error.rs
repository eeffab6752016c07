//! Engine errors
//!
//! All fallible engine operations return [`EngineResult`].

use thiserror::Error;

use crate::types::UserId;

/// Errors surfaced by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The request was rejected before any state was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An optimistic progression update lost a race. Retryable: re-read
    /// state and try again.
    #[error("concurrent update conflict for user {0}")]
    Conflict(UserId),

    /// No progression row exists for this user.
    #[error("unknown user {0}")]
    UserNotFound(UserId),

    /// A badge code was referenced that the catalog does not define.
    #[error("unknown badge code `{0}`")]
    BadgeUnknown(String),

    /// The backing store failed.
    #[error("store failure: {0}")]
    Store(String),
}

impl EngineError {
    /// Whether the caller may retry the operation after re-reading state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Conflict(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
