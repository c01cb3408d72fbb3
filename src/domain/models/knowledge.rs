//! Knowledge updates: proposed changes to a collaborator's reference
//! knowledge, gated by an approve-then-implement workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::capability::AgentType;
use super::feedback::ReviewStatus;

/// A proposed change to a collaborator's knowledge base.
///
/// Two-phase workflow: the update is created `Pending`, must be approved,
/// and only an approved update can be implemented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeUpdate {
    /// Unique update identifier.
    pub id: Uuid,
    /// Session the update originated from.
    pub session_id: String,
    /// Free-form kind tag, e.g. "correction" or "addition". The taxonomy is
    /// collaborator-specific, so this stays a string.
    pub update_type: String,
    /// Agent whose knowledge the update targets.
    pub target_agent: AgentType,
    /// The proposed change.
    pub content: String,
    /// Feedback that triggered this update, if any.
    pub source_feedback: Option<Uuid>,
    /// Whether an explicit approval is required before implementation.
    pub approval_required: bool,
    /// Current workflow status.
    pub status: ReviewStatus,
    /// Who approved the update.
    pub approved_by: Option<String>,
    /// When it was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When it was implemented.
    pub implemented_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl KnowledgeUpdate {
    /// Creates a pending knowledge update.
    pub fn new(
        session_id: impl Into<String>,
        update_type: impl Into<String>,
        target_agent: AgentType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            update_type: update_type.into(),
            target_agent,
            content: content.into(),
            source_feedback: None,
            approval_required: true,
            status: ReviewStatus::Pending,
            approved_by: None,
            approved_at: None,
            implemented_at: None,
            created_at: Utc::now(),
        }
    }

    /// Links the feedback record that triggered this update.
    pub fn with_source_feedback(mut self, feedback_id: Uuid) -> Self {
        self.source_feedback = Some(feedback_id);
        self
    }

    /// Approves the update. Returns false when not currently pending or
    /// processing.
    pub fn approve(&mut self, approver: &str) -> bool {
        if !self.status.can_transition_to(ReviewStatus::Approved) {
            return false;
        }
        self.status = ReviewStatus::Approved;
        self.approved_by = Some(approver.to_string());
        self.approved_at = Some(Utc::now());
        true
    }

    /// Implements the update. Succeeds only from `Approved`.
    pub fn implement(&mut self) -> bool {
        if !self.status.can_transition_to(ReviewStatus::Implemented) {
            return false;
        }
        self.status = ReviewStatus::Implemented;
        self.implemented_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_update() -> KnowledgeUpdate {
        KnowledgeUpdate::new(
            "session_1",
            "correction",
            AgentType::ProductSupplement,
            "Barrier observation is quarterly, not monthly",
        )
    }

    #[test]
    fn test_implement_requires_approval() {
        let mut update = test_update();
        assert!(!update.implement());
        assert_eq!(update.status, ReviewStatus::Pending);
        assert!(update.implemented_at.is_none());
    }

    #[test]
    fn test_approve_then_implement() {
        let mut update = test_update();

        assert!(update.approve("compliance"));
        assert_eq!(update.status, ReviewStatus::Approved);
        assert_eq!(update.approved_by.as_deref(), Some("compliance"));

        assert!(update.implement());
        assert_eq!(update.status, ReviewStatus::Implemented);
        assert!(update.implemented_at.is_some());
    }

    #[test]
    fn test_double_approve_fails() {
        let mut update = test_update();
        assert!(update.approve("compliance"));
        assert!(!update.approve("someone-else"));
        assert_eq!(update.approved_by.as_deref(), Some("compliance"));
    }
}
