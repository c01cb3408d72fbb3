//! Collaborator port - interface for document-generation backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::models::AgentType;

/// Typed failure a collaborator can return.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Collaborator not available: {0}")]
    NotAvailable(String),
}

/// Fully-materialized input record for one collaborator invocation.
///
/// `fields` is the union of the agent's required and optional capability
/// fields as far as they could be populated; any required field that had to
/// be default-filled is listed in `missing_fields`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Agent being invoked.
    pub agent_type: AgentType,
    /// Session the request belongs to.
    pub session_id: String,
    /// The (possibly annotated) request text.
    pub request_text: String,
    /// Populated input fields.
    pub fields: HashMap<String, serde_json::Value>,
    /// Required fields that were default-filled.
    pub missing_fields: Vec<String>,
}

/// Trait for document-generation collaborator implementations.
///
/// A collaborator is the external capability behind one agent tag. Prompt
/// construction, LLM invocation, and binary rendering all live behind this
/// seam; the orchestration core only sees opaque structured content or a
/// typed failure.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// The agent type this collaborator serves.
    fn agent_type(&self) -> AgentType;

    /// Whether the collaborator is registered and ready to generate.
    async fn is_available(&self) -> bool;

    /// Generates document content for a fully-populated input record.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<serde_json::Value, CollaboratorError>;
}
