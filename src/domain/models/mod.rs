//! Domain models for the orchestration core.

pub mod audit;
pub mod capability;
pub mod extraction;
pub mod feedback;
pub mod knowledge;
pub mod result;
pub mod routing;
pub mod session;

pub use audit::{AuditAction, AuditEntry, AuditFilter, ResourceType};
pub use capability::{AgentCapability, AgentType, TaskType, CAPABILITIES};
pub use extraction::ExtractedInformation;
pub use feedback::{Feedback, FeedbackPriority, FeedbackType, ReviewStatus};
pub use knowledge::KnowledgeUpdate;
pub use result::{
    AgentErrorKind, AgentOutcome, AgentResult, ExecutionSummary, FieldMapping,
    IngestFeedbackRequest, IngestFeedbackResponse, OrchestratorResponse,
};
pub use routing::{RoutingDecision, Subtask, SubtaskPriority};
pub use session::{
    ArchivedSession, ConversationState, Message, MessageType, Sender, Session, SessionStatus,
};
