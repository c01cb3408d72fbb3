//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that adapters must implement:
//! - Collaborator: document-generation backends, one per agent tag
//! - SessionArchiver: durable sink for archived sessions
//!
//! These traits keep the orchestration core independent of how documents are
//! actually generated or where archives land.

pub mod archiver;
pub mod collaborator;

pub use archiver::SessionArchiver;
pub use collaborator::{Collaborator, CollaboratorError, GenerationRequest};
