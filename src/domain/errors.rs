//! Domain errors for the docuforge orchestration core.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur in the orchestration core.
///
/// Lookup misses on sessions, feedback, and knowledge updates are surfaced
/// as `Option`/`bool` by the store APIs; these variants cover structural
/// failures and collaborator-boundary errors.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Feedback not found: {0}")]
    FeedbackNotFound(Uuid),

    #[error("Knowledge update not found: {0}")]
    KnowledgeUpdateNotFound(Uuid),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Agent not available: {0}")]
    AgentUnavailable(String),

    #[error("Agent execution failed for {agent}: {reason}")]
    AgentExecutionFailed { agent: String, reason: String },

    #[error("Collaborator timed out after {0}s")]
    Timeout(u64),

    #[error("Knowledge update conflict for {id}: {reason}")]
    KnowledgeUpdateConflict { id: Uuid, reason: String },

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),
}

/// Convenience alias used throughout the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::ArchiveError(err.to_string())
    }
}
