//! Conversation store: sessions, feedback, knowledge updates, audit trail.
//!
//! Owns all mutable state in the orchestration core. In-memory by design;
//! durability is limited to the archival artifact written when a session is
//! explicitly archived.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    ArchivedSession, AuditAction, AuditEntry, AuditFilter, ConversationState, Feedback,
    KnowledgeUpdate, Message, ResourceType, ReviewStatus, Session, SessionStatus,
};
use crate::domain::ports::SessionArchiver;
use crate::services::audit_log::{AuditLog, AuditStats};

/// Read-only rollup of a session's feedback history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedbackSummary {
    pub total: usize,
    pub by_status: HashMap<String, usize>,
    pub by_type: HashMap<String, usize>,
    pub pending: Vec<Uuid>,
}

/// Read-only rollup of a session's knowledge updates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KnowledgeUpdateSummary {
    pub total: usize,
    pub by_status: HashMap<String, usize>,
    pub awaiting_approval: Vec<Uuid>,
    pub implemented: usize,
}

/// Store-wide counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStatistics {
    pub active_sessions: usize,
    pub sessions_by_state: HashMap<String, usize>,
    pub total_messages: usize,
    pub total_feedback: usize,
    pub total_knowledge_updates: usize,
    pub audit: AuditStats,
}

/// Manager for all conversation state.
///
/// Lookup misses return `None`/`false` rather than erroring; only archival
/// IO and serialization surface as `DomainError`. Each mutation holds the
/// session-map write guard across the audit append, so a session's
/// `updated_at`, its appended record, and the matching audit entry are
/// always consistent.
pub struct ConversationStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    audit: Arc<AuditLog>,
    archiver: Arc<dyn SessionArchiver>,
}

impl ConversationStore {
    /// Creates a store with the given audit log and archiver.
    pub fn new(audit: Arc<AuditLog>, archiver: Arc<dyn SessionArchiver>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            audit,
            archiver,
        }
    }

    /// The shared audit log.
    pub fn audit_log(&self) -> Arc<AuditLog> {
        Arc::clone(&self.audit)
    }

    /// Gets or creates the session for `session_id`.
    ///
    /// A second call with the same id returns the existing session rather
    /// than replacing it; `None` generates a fresh UUID-keyed session.
    #[instrument(skip(self))]
    pub async fn create_session(&self, session_id: Option<String>) -> Session {
        let mut sessions = self.sessions.write().await;

        if let Some(ref id) = session_id {
            if let Some(existing) = sessions.get(id) {
                return existing.clone();
            }
        }

        let session = match session_id {
            Some(id) => Session::new(id),
            None => Session::new_with_uuid(),
        };
        sessions.insert(session.id.clone(), session.clone());

        self.audit
            .record(
                AuditEntry::new(
                    &session.id,
                    AuditAction::SessionCreated,
                    ResourceType::Session,
                    &session.id,
                )
                .with_detail("status", json!(session.status)),
            )
            .await;

        session
    }

    /// Fetches an active session by id.
    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Appends a message to a session. Returns false for unknown sessions.
    #[instrument(skip(self, message), fields(message_id = %message.id))]
    pub async fn add_message(&self, session_id: &str, message: Message) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_id) else {
            warn!(session_id, "add_message on unknown session");
            return false;
        };

        let entry = AuditEntry::new(
            session_id,
            AuditAction::MessageAdded,
            ResourceType::Message,
            message.id.to_string(),
        )
        .with_detail("sender", json!(message.sender))
        .with_detail("message_type", json!(message.message_type))
        .with_detail("content_length", json!(message.content.len()));

        session.append_message(message);
        self.audit.record(entry).await;
        true
    }

    /// Appends feedback to its session. Returns false for unknown sessions.
    #[instrument(skip(self, feedback), fields(feedback_id = %feedback.id))]
    pub async fn add_feedback(&self, feedback: Feedback) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&feedback.session_id) else {
            warn!(session_id = %feedback.session_id, "add_feedback on unknown session");
            return false;
        };

        let entry = AuditEntry::new(
            &feedback.session_id,
            AuditAction::FeedbackSubmitted,
            ResourceType::Feedback,
            feedback.id.to_string(),
        )
        .with_detail("feedback_type", json!(feedback.feedback_type))
        .with_detail("priority", json!(feedback.priority))
        .with_detail("target_agent", json!(feedback.target_agent));

        session.feedback_history.push(feedback);
        session.touch();
        self.audit.record(entry).await;
        true
    }

    /// Fetches one feedback record by id.
    pub async fn get_feedback(&self, feedback_id: Uuid) -> Option<Feedback> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .flat_map(|s| s.feedback_history.iter())
            .find(|f| f.id == feedback_id)
            .cloned()
    }

    /// Moves a feedback record to a new status.
    ///
    /// Returns false when the id is unknown or the transition is illegal.
    #[instrument(skip(self))]
    pub async fn process_feedback(
        &self,
        feedback_id: Uuid,
        processor: &str,
        new_status: ReviewStatus,
        resolution: Option<String>,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some((session_id, feedback)) = sessions.values_mut().find_map(|session| {
            let id = session.id.clone();
            session
                .feedback_history
                .iter_mut()
                .find(|f| f.id == feedback_id)
                .map(|f| (id, f))
        }) else {
            warn!(%feedback_id, "process_feedback on unknown feedback");
            return false;
        };

        let previous = feedback.status;
        if !feedback.transition(new_status, processor) {
            warn!(
                %feedback_id,
                from = previous.as_str(),
                to = new_status.as_str(),
                "illegal feedback transition"
            );
            return false;
        }
        feedback.resolution = resolution.clone();

        let entry = AuditEntry::new(
            &session_id,
            AuditAction::FeedbackProcessed,
            ResourceType::Feedback,
            feedback_id.to_string(),
        )
        .with_user(processor)
        .with_detail("from", json!(previous.as_str()))
        .with_detail("to", json!(new_status.as_str()))
        .with_detail("resolution", json!(resolution));

        if let Some(session) = sessions.get_mut(&session_id) {
            session.touch();
        }
        self.audit.record(entry).await;
        true
    }

    /// Records a pending knowledge update on its session.
    ///
    /// Returns the update id, or `None` for unknown sessions.
    #[instrument(skip(self, update), fields(update_id = %update.id))]
    pub async fn create_knowledge_update(&self, update: KnowledgeUpdate) -> Option<Uuid> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&update.session_id) else {
            warn!(session_id = %update.session_id, "create_knowledge_update on unknown session");
            return None;
        };

        let id = update.id;
        let entry = AuditEntry::new(
            &update.session_id,
            AuditAction::KnowledgeUpdateCreated,
            ResourceType::KnowledgeUpdate,
            id.to_string(),
        )
        .with_detail("target_agent", json!(update.target_agent))
        .with_detail("update_type", json!(update.update_type))
        .with_detail("approval_required", json!(update.approval_required));

        session.knowledge_updates.push(update);
        session.touch();
        self.audit.record(entry).await;
        Some(id)
    }

    /// Approves a pending knowledge update.
    #[instrument(skip(self))]
    pub async fn approve_knowledge_update(&self, update_id: Uuid, approver: &str) -> bool {
        self.transition_knowledge_update(
            update_id,
            AuditAction::KnowledgeUpdateApproved,
            approver,
            |update| update.approve(approver),
        )
        .await
    }

    /// Implements an approved knowledge update.
    ///
    /// Fails (returns false) unless the update's current status is approved.
    #[instrument(skip(self))]
    pub async fn implement_knowledge_update(&self, update_id: Uuid, implementer: &str) -> bool {
        self.transition_knowledge_update(
            update_id,
            AuditAction::KnowledgeUpdateImplemented,
            implementer,
            KnowledgeUpdate::implement,
        )
        .await
    }

    async fn transition_knowledge_update(
        &self,
        update_id: Uuid,
        action: AuditAction,
        actor: &str,
        apply: impl FnOnce(&mut KnowledgeUpdate) -> bool,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some((session_id, update)) = sessions.values_mut().find_map(|session| {
            let id = session.id.clone();
            session
                .knowledge_updates
                .iter_mut()
                .find(|u| u.id == update_id)
                .map(|u| (id, u))
        }) else {
            warn!(%update_id, "knowledge update not found");
            return false;
        };

        let previous = update.status;
        if !apply(update) {
            warn!(
                %update_id,
                status = previous.as_str(),
                "knowledge update transition rejected"
            );
            return false;
        }

        let entry = AuditEntry::new(
            &session_id,
            action,
            ResourceType::KnowledgeUpdate,
            update_id.to_string(),
        )
        .with_user(actor)
        .with_detail("from", json!(previous.as_str()))
        .with_detail("to", json!(update.status.as_str()));

        if let Some(session) = sessions.get_mut(&session_id) {
            session.touch();
        }
        self.audit.record(entry).await;
        true
    }

    /// Updates a session's conversation state. Returns false for unknown
    /// sessions or transitions out of a terminal state.
    pub async fn set_conversation_state(
        &self,
        session_id: &str,
        state: ConversationState,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions
            .get_mut(session_id)
            .is_some_and(|session| session.set_conversation_state(state))
    }

    /// Stores a metadata value on a session. Returns false for unknown
    /// sessions.
    pub async fn set_session_metadata(
        &self,
        session_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_id) else {
            return false;
        };
        session.metadata.insert(key.to_string(), value);
        session.touch();
        true
    }

    /// Records an agent result on a session. Returns false for unknown
    /// sessions.
    #[instrument(skip(self, result), fields(agent = %result.agent_type))]
    pub async fn record_agent_result(
        &self,
        session_id: &str,
        result: crate::domain::models::AgentResult,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_id) else {
            warn!(session_id, "record_agent_result on unknown session");
            return false;
        };

        let entry = AuditEntry::new(
            session_id,
            AuditAction::AgentExecuted,
            ResourceType::AgentResult,
            result.agent_type.as_str(),
        )
        .with_detail("success", json!(result.success))
        .with_detail("error_kind", json!(result.error_kind))
        .with_detail("processing_time_ms", json!(result.processing_time_ms));

        session.record_agent_result(result);
        self.audit.record(entry).await;
        true
    }

    /// Archives a session: marks it archived, writes the full history as a
    /// durable artifact, then removes it from the active map.
    ///
    /// Returns `Ok(false)` for unknown sessions. The session stays in the
    /// map (marked archived) while the artifact is written, so a concurrent
    /// `create_session` with the same id joins the existing session instead
    /// of racing a fresh one into its slot. On archiver failure the mark is
    /// reverted and the error is returned; the archive audit entry is only
    /// recorded once the write has succeeded.
    #[instrument(skip(self))]
    pub async fn archive(&self, session_id: &str) -> DomainResult<bool> {
        let (document, previous_status) = {
            let mut sessions = self.sessions.write().await;
            let Some(session) = sessions.get_mut(session_id) else {
                return Ok(false);
            };

            let previous_status = session.status;
            session.status = SessionStatus::Archived;
            session.touch();

            let document = ArchivedSession {
                audit_entries: self.audit.for_session(session_id).await,
                session: session.clone(),
                archived_at: Utc::now(),
            };
            (document, previous_status)
        };

        if let Err(err) = self.archiver.archive(&document).await {
            warn!(session_id, error = %err, "archive write failed, keeping session active");
            let mut sessions = self.sessions.write().await;
            if let Some(session) = sessions.get_mut(session_id) {
                session.status = previous_status;
                session.touch();
            }
            return Err(err);
        }

        {
            let mut sessions = self.sessions.write().await;
            sessions.remove(session_id);
        }
        self.audit
            .record(AuditEntry::new(
                session_id,
                AuditAction::SessionArchived,
                ResourceType::Session,
                session_id,
            ))
            .await;

        Ok(true)
    }

    /// Rollup of one session's feedback. `None` for unknown sessions.
    pub async fn feedback_summary(&self, session_id: &str) -> Option<FeedbackSummary> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(session_id)?;

        let mut summary = FeedbackSummary {
            total: session.feedback_history.len(),
            ..Default::default()
        };
        for feedback in &session.feedback_history {
            *summary
                .by_status
                .entry(feedback.status.as_str().to_string())
                .or_default() += 1;
            let type_tag = serde_json::to_value(feedback.feedback_type)
                .ok()
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default();
            *summary.by_type.entry(type_tag).or_default() += 1;
            if feedback.status == ReviewStatus::Pending {
                summary.pending.push(feedback.id);
            }
        }
        Some(summary)
    }

    /// Rollup of one session's knowledge updates. `None` for unknown
    /// sessions.
    pub async fn knowledge_update_summary(
        &self,
        session_id: &str,
    ) -> Option<KnowledgeUpdateSummary> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(session_id)?;

        let mut summary = KnowledgeUpdateSummary {
            total: session.knowledge_updates.len(),
            ..Default::default()
        };
        for update in &session.knowledge_updates {
            *summary
                .by_status
                .entry(update.status.as_str().to_string())
                .or_default() += 1;
            match update.status {
                ReviewStatus::Pending | ReviewStatus::Processing => {
                    summary.awaiting_approval.push(update.id);
                }
                ReviewStatus::Implemented => summary.implemented += 1,
                _ => {}
            }
        }
        Some(summary)
    }

    /// Queries the global audit trail.
    pub async fn audit_trail(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        self.audit.query(filter).await
    }

    /// Store-wide counters.
    pub async fn statistics(&self) -> StoreStatistics {
        let sessions = self.sessions.read().await;

        let mut stats = StoreStatistics {
            active_sessions: sessions.len(),
            ..Default::default()
        };
        for session in sessions.values() {
            let state_tag = serde_json::to_value(session.conversation_state)
                .ok()
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default();
            *stats.sessions_by_state.entry(state_tag).or_default() += 1;
            stats.total_messages += session.messages.len();
            stats.total_feedback += session.feedback_history.len();
            stats.total_knowledge_updates += session.knowledge_updates.len();
        }
        drop(sessions);

        stats.audit = self.audit.stats().await;
        stats
    }
}
