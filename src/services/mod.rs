pub mod audit_log;
pub mod config;
pub mod conversation_store;
pub mod logging;
pub mod orchestrator;
pub mod registry;
pub mod router;

pub use audit_log::{AuditLog, AuditStats};
pub use config::{Config, ConfigError};
pub use conversation_store::{
    ConversationStore, FeedbackSummary, KnowledgeUpdateSummary, StoreStatistics,
};
pub use logging::{LogConfig, LogFormat};
pub use orchestrator::{Orchestrator, RequestOptions};
pub use registry::CollaboratorRegistry;
pub use router::IntentRouter;
