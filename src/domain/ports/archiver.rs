//! Session archiver port - durable sink for archived sessions.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::ArchivedSession;

/// Trait for archival sinks.
///
/// Archiving is a one-way transition: the store hands over the full session
/// history and expects a durable artifact keyed by session id.
#[async_trait]
pub trait SessionArchiver: Send + Sync {
    /// Persists the archived session document.
    async fn archive(&self, document: &ArchivedSession) -> DomainResult<()>;
}
