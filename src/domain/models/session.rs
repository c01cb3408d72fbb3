//! Domain models for conversation sessions.
//!
//! A session spans one or more requests and feedback rounds against the same
//! set of generated documents, and owns the ordered message, feedback, and
//! knowledge-update history for that conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::audit::AuditEntry;
use super::capability::AgentType;
use super::feedback::Feedback;
use super::knowledge::KnowledgeUpdate;
use super::result::AgentResult;

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session is live and accepting requests
    Active,
    /// Session temporarily paused
    Paused,
    /// Conversation finished
    Completed,
    /// Session archived; terminal and unreachable via the active map
    Archived,
    /// Session hit an orchestrator-level failure
    Error,
}

/// Conversation state machine driven by the orchestrator.
///
/// `Initialized -> Processing -> AwaitingFeedback -> {Processing, Completed,
/// Error}`. `Completed` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Initialized,
    Processing,
    AwaitingFeedback,
    Completed,
    Error,
}

impl ConversationState {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Who authored a message within a session.
///
/// Serialized as `"user"`, `"system"`, or the agent tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sender {
    /// A known agent, serialized as its tag
    Agent(AgentType),
    /// The requesting user or the orchestrator itself
    Named(String),
}

impl Sender {
    /// The requesting user.
    pub fn user() -> Self {
        Self::Named("user".to_string())
    }

    /// The orchestrator/system.
    pub fn system() -> Self {
        Self::Named("system".to_string())
    }
}

/// Kind of message appended to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Raw user request text
    Request,
    /// Agent-produced output notice
    Response,
    /// Feedback-related note
    Feedback,
    /// Orchestrator bookkeeping note
    System,
}

/// One immutable message in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: Uuid,
    /// When the message was appended.
    pub timestamp: DateTime<Utc>,
    /// Author: user, system, or an agent tag.
    pub sender: Sender,
    /// Kind of message.
    pub message_type: MessageType,
    /// Message text.
    pub content: String,
    /// Extensible metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Attachment references.
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl Message {
    /// Creates a message with the required fields.
    pub fn new(sender: Sender, message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            sender,
            message_type,
            content: content.into(),
            metadata: HashMap::new(),
            attachments: Vec::new(),
        }
    }

    /// Adds one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Adds an attachment reference.
    pub fn with_attachment(mut self, reference: impl Into<String>) -> Self {
        self.attachments.push(reference.into());
        self
    }
}

/// A stateful, identified conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Conversation state machine position.
    pub conversation_state: ConversationState,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Ordered message history.
    pub messages: Vec<Message>,
    /// Ordered feedback history.
    pub feedback_history: Vec<Feedback>,
    /// Ordered knowledge updates.
    pub knowledge_updates: Vec<KnowledgeUpdate>,
    /// Latest result per agent.
    pub agent_results: HashMap<AgentType, AgentResult>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Extensible metadata; the orchestrator records the original request
    /// and last primary agent here.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Session {
    /// Creates an active session with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: SessionStatus::Active,
            conversation_state: ConversationState::Initialized,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            feedback_history: Vec::new(),
            knowledge_updates: Vec::new(),
            agent_results: HashMap::new(),
            tags: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Creates a session with a generated UUID identifier.
    pub fn new_with_uuid() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Bumps the last-mutation timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Appends a message and bumps `updated_at`.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    /// Moves the conversation state machine.
    ///
    /// Returns false and leaves the state untouched when the current state
    /// is terminal.
    pub fn set_conversation_state(&mut self, state: ConversationState) -> bool {
        if self.conversation_state.is_terminal() {
            return false;
        }
        self.conversation_state = state;
        if state == ConversationState::Completed {
            self.status = SessionStatus::Completed;
        } else if state == ConversationState::Error {
            self.status = SessionStatus::Error;
        }
        self.touch();
        true
    }

    /// Records the latest result for an agent.
    pub fn record_agent_result(&mut self, result: AgentResult) {
        self.agent_results.insert(result.agent_type, result);
        self.touch();
    }

    /// Whether the session can accept further requests or feedback.
    pub fn can_accept_input(&self) -> bool {
        matches!(self.status, SessionStatus::Active | SessionStatus::Paused)
            && !self.conversation_state.is_terminal()
    }
}

/// Durable artifact written when a session is archived.
///
/// Serialized as one JSON document keyed by session id: session metadata and
/// ordered histories first, then the session's slice of the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedSession {
    /// The full session, including messages, feedback, and knowledge updates.
    pub session: Session,
    /// Audit entries belonging to this session at archive time.
    pub audit_entries: Vec<AuditEntry>,
    /// When the archive was taken.
    pub archived_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::result::AgentResult;
    use serde_json::json;

    #[test]
    fn test_new_session() {
        let session = Session::new("session_1");
        assert_eq!(session.id, "session_1");
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.conversation_state, ConversationState::Initialized);
        assert!(session.messages.is_empty());
        assert!(session.can_accept_input());
    }

    #[test]
    fn test_append_message_touches() {
        let mut session = Session::new("session_1");
        let before = session.updated_at;

        session.append_message(Message::new(
            Sender::user(),
            MessageType::Request,
            "Generate an investor summary",
        ));

        assert_eq!(session.messages.len(), 1);
        assert!(session.updated_at >= before);
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let mut session = Session::new("session_1");
        assert!(session.set_conversation_state(ConversationState::Processing));
        assert!(session.set_conversation_state(ConversationState::Completed));
        assert_eq!(session.status, SessionStatus::Completed);

        assert!(!session.set_conversation_state(ConversationState::Processing));
        assert_eq!(session.conversation_state, ConversationState::Completed);
        assert!(!session.can_accept_input());
    }

    #[test]
    fn test_record_agent_result_overwrites() {
        let mut session = Session::new("session_1");
        session.record_agent_result(AgentResult::success(
            AgentType::InvestorSummary,
            json!({"v": 1}),
            5,
        ));
        session.record_agent_result(AgentResult::success(
            AgentType::InvestorSummary,
            json!({"v": 2}),
            7,
        ));

        assert_eq!(session.agent_results.len(), 1);
        let result = &session.agent_results[&AgentType::InvestorSummary];
        assert_eq!(result.content, Some(json!({"v": 2})));
    }

    #[test]
    fn test_sender_serialization() {
        assert_eq!(
            serde_json::to_string(&Sender::user()).unwrap(),
            "\"user\""
        );
        assert_eq!(
            serde_json::to_string(&Sender::Agent(AgentType::PricingSupplement)).unwrap(),
            "\"pricing-supplement\""
        );
    }

    #[test]
    fn test_states_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Archived).unwrap(),
            "\"archived\""
        );
        assert_eq!(
            serde_json::to_string(&ConversationState::AwaitingFeedback).unwrap(),
            "\"awaiting_feedback\""
        );
    }
}
