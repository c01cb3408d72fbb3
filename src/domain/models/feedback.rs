//! User feedback on generated documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::capability::AgentType;

/// The kind of feedback a user can give.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    /// Accept the generated documents; closes the conversation
    Approval,
    /// Reject and regenerate with the complaint folded in
    Rejection,
    /// Regenerate with a specific content change
    ContentUpdate,
    /// Propose a change to a collaborator's reference knowledge
    KnowledgeUpdate,
    /// Question about the output; logged, no side effect
    Clarification,
}

/// Urgency attached to a piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for FeedbackPriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Review lifecycle shared by feedback and knowledge updates.
///
/// Legal transitions: `Pending -> Processing -> {Approved, Rejected, Failed}`
/// (the intermediate `Processing` step may be skipped), and
/// `Approved -> Implemented`. Everything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Processing,
    Approved,
    Rejected,
    Implemented,
    Failed,
}

impl ReviewStatus {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: ReviewStatus) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::Processing | Self::Approved | Self::Rejected | Self::Failed
            ) | (
                Self::Processing,
                Self::Approved | Self::Rejected | Self::Failed
            ) | (Self::Approved, Self::Implemented)
        )
    }

    /// Lowercase tag used in audit details.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Implemented => "implemented",
            Self::Failed => "failed",
        }
    }
}

/// One piece of structured user feedback on a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Unique feedback identifier.
    pub id: Uuid,
    /// Session this feedback belongs to.
    pub session_id: String,
    /// What kind of feedback this is.
    pub feedback_type: FeedbackType,
    /// The feedback text itself.
    pub content: String,
    /// Agent the feedback targets, if any.
    pub target_agent: Option<AgentType>,
    /// Urgency.
    pub priority: FeedbackPriority,
    /// Current review status.
    pub status: ReviewStatus,
    /// Who processed this feedback.
    pub processed_by: Option<String>,
    /// When it reached a terminal status.
    pub processed_at: Option<DateTime<Utc>>,
    /// Outcome note recorded by the processor.
    pub resolution: Option<String>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// Creates pending feedback for a session.
    pub fn new(
        session_id: impl Into<String>,
        feedback_type: FeedbackType,
        content: impl Into<String>,
        priority: FeedbackPriority,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            feedback_type,
            content: content.into(),
            target_agent: None,
            priority,
            status: ReviewStatus::Pending,
            processed_by: None,
            processed_at: None,
            resolution: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the targeted agent.
    pub fn with_target(mut self, agent: AgentType) -> Self {
        self.target_agent = Some(agent);
        self
    }

    /// Attempts a status transition, stamping the processor on success.
    ///
    /// Returns false and leaves the record untouched when the transition is
    /// illegal.
    pub fn transition(&mut self, next: ReviewStatus, processor: &str) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.processed_by = Some(processor.to_string());
        self.processed_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(ReviewStatus::Pending.can_transition_to(ReviewStatus::Processing));
        assert!(ReviewStatus::Pending.can_transition_to(ReviewStatus::Approved));
        assert!(ReviewStatus::Processing.can_transition_to(ReviewStatus::Failed));
        assert!(ReviewStatus::Approved.can_transition_to(ReviewStatus::Implemented));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!ReviewStatus::Pending.can_transition_to(ReviewStatus::Implemented));
        assert!(!ReviewStatus::Rejected.can_transition_to(ReviewStatus::Approved));
        assert!(!ReviewStatus::Implemented.can_transition_to(ReviewStatus::Pending));
        assert!(!ReviewStatus::Failed.can_transition_to(ReviewStatus::Processing));
    }

    #[test]
    fn test_transition_stamps_processor() {
        let mut feedback = Feedback::new(
            "session_1",
            FeedbackType::Rejection,
            "Wrong issuer name",
            FeedbackPriority::High,
        );

        assert!(feedback.transition(ReviewStatus::Processing, "orchestrator"));
        assert_eq!(feedback.processed_by.as_deref(), Some("orchestrator"));
        assert!(feedback.processed_at.is_some());

        assert!(!feedback.transition(ReviewStatus::Implemented, "orchestrator"));
        assert_eq!(feedback.status, ReviewStatus::Processing);
    }
}
