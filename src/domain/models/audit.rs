//! Audit trail types: immutable records of state-changing actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The state-changing action an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    SessionCreated,
    MessageAdded,
    RequestRouted,
    AgentExecuted,
    FeedbackSubmitted,
    FeedbackProcessed,
    KnowledgeUpdateCreated,
    KnowledgeUpdateApproved,
    KnowledgeUpdateImplemented,
    SessionArchived,
}

impl AuditAction {
    /// Lowercase tag for display and filtering.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionCreated => "session_created",
            Self::MessageAdded => "message_added",
            Self::RequestRouted => "request_routed",
            Self::AgentExecuted => "agent_executed",
            Self::FeedbackSubmitted => "feedback_submitted",
            Self::FeedbackProcessed => "feedback_processed",
            Self::KnowledgeUpdateCreated => "knowledge_update_created",
            Self::KnowledgeUpdateApproved => "knowledge_update_approved",
            Self::KnowledgeUpdateImplemented => "knowledge_update_implemented",
            Self::SessionArchived => "session_archived",
        }
    }
}

/// The kind of resource an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Session,
    Message,
    Feedback,
    KnowledgeUpdate,
    AgentResult,
}

impl ResourceType {
    /// Lowercase tag for display and filtering.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Message => "message",
            Self::Feedback => "feedback",
            Self::KnowledgeUpdate => "knowledge_update",
            Self::AgentResult => "agent_result",
        }
    }
}

/// One immutable record of a state-changing action.
///
/// `details` carries a snapshot of the salient values, not raw content, to
/// bound entry size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// When the action occurred.
    pub timestamp: DateTime<Utc>,
    /// Session the action belongs to.
    pub session_id: String,
    /// Acting user, when known.
    pub user_id: Option<String>,
    /// What happened.
    pub action: AuditAction,
    /// Kind of resource acted on.
    pub resource_type: ResourceType,
    /// Identifier of the resource acted on.
    pub resource_id: String,
    /// Bounded details snapshot.
    pub details: HashMap<String, serde_json::Value>,
}

impl AuditEntry {
    /// Creates an audit entry for an action on a resource.
    pub fn new(
        session_id: impl Into<String>,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            session_id: session_id.into(),
            user_id: None,
            action,
            resource_type,
            resource_id: resource_id.into(),
            details: HashMap::new(),
        }
    }

    /// Sets the acting user.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Adds one detail to the snapshot.
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Filter for querying the audit trail.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Restrict to one session.
    pub session_id: Option<String>,
    /// Restrict to one action.
    pub action: Option<AuditAction>,
    /// Restrict to one resource type.
    pub resource_type: Option<ResourceType>,
    /// Inclusive start of time range.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive end of time range.
    pub to: Option<DateTime<Utc>>,
    /// Cap on returned entries.
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// An empty filter matching everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one session.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Restricts to one action.
    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Restricts to one resource type.
    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    /// Restricts to a time range.
    pub fn with_time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Caps the number of returned entries.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether an entry matches this filter.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(ref session_id) = self.session_id {
            if &entry.session_id != session_id {
                return false;
            }
        }

        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }

        if let Some(resource_type) = self.resource_type {
            if entry.resource_type != resource_type {
                return false;
            }
        }

        if let Some(from) = self.from {
            if entry.timestamp < from {
                return false;
            }
        }

        if let Some(to) = self.to {
            if entry.timestamp > to {
                return false;
            }
        }

        true
    }
}
