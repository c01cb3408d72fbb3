//! Docuforge - document-generation orchestration core
//!
//! Docuforge coordinates a set of document-generation collaborators for
//! structured financial products: it routes free-text requests to the right
//! collaborator, tracks the conversation and its audit trail, and drives the
//! feedback loop over generated documents.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, ports, and domain errors
//! - **Service Layer** (`services`): Router, conversation store, orchestrator
//! - **Adapters** (`adapters`): Implementations behind the domain ports
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docuforge::adapters::archive::FilesystemArchiver;
//! use docuforge::services::{
//!     AuditLog, CollaboratorRegistry, Config, ConversationStore, Orchestrator, RequestOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let store = Arc::new(ConversationStore::new(
//!         Arc::new(AuditLog::new(config.audit.max_entries)),
//!         Arc::new(FilesystemArchiver::new(&config.archive.base_path)),
//!     ));
//!     let registry = Arc::new(CollaboratorRegistry::new());
//!     let orchestrator = Orchestrator::new(&config, store, registry);
//!
//!     let response = orchestrator
//!         .process_request(None, "Create an investor summary", RequestOptions::default())
//!         .await?;
//!     println!("{}", response.session_id);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AgentResult, AgentType, ConversationState, Feedback, FeedbackType, OrchestratorResponse,
    RoutingDecision, Session, SessionStatus,
};
pub use domain::ports::{Collaborator, CollaboratorError, GenerationRequest, SessionArchiver};
pub use services::{
    AuditLog, CollaboratorRegistry, Config, ConversationStore, IntentRouter, Orchestrator,
    RequestOptions,
};
