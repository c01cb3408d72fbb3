//! Request orchestration: routing, plan execution, and feedback handling.
//!
//! The orchestrator is the only writer of conversation state. It turns a raw
//! request into an execution plan, invokes collaborators in isolation, and
//! drives the feedback state machine afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentErrorKind, AgentResult, AgentType, AuditAction, AuditEntry, ConversationState,
    ExecutionSummary, Feedback, FeedbackType, FieldMapping, IngestFeedbackRequest,
    IngestFeedbackResponse, KnowledgeUpdate, Message, MessageType, OrchestratorResponse,
    ResourceType, ReviewStatus, RoutingDecision, Sender,
};
use crate::domain::ports::{CollaboratorError, GenerationRequest};
use crate::services::config::Config;
use crate::services::conversation_store::ConversationStore;
use crate::services::registry::CollaboratorRegistry;
use crate::services::router::IntentRouter;

/// Processor tag stamped on feedback handled by the orchestrator.
const PROCESSOR: &str = "orchestrator";

/// Placeholder written into required fields the router could not extract.
const DEFAULT_FIELD_VALUE: &str = "TBD";

/// Caller-supplied overrides for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Explicit agent tags; when any parse, they replace the routed plan.
    /// Unknown tags are dropped with a warning.
    pub explicit_agents: Vec<String>,
    /// Run every registered agent type instead of the routed plan.
    pub run_all: bool,
}

/// Coordinates the router, the conversation store, and the collaborators.
pub struct Orchestrator {
    timeout_secs: u64,
    router: IntentRouter,
    store: Arc<ConversationStore>,
    registry: Arc<CollaboratorRegistry>,
}

impl Orchestrator {
    /// Creates an orchestrator over a store and collaborator registry.
    pub fn new(
        config: &Config,
        store: Arc<ConversationStore>,
        registry: Arc<CollaboratorRegistry>,
    ) -> Self {
        Self {
            timeout_secs: config.orchestrator.collaborator_timeout_secs,
            router: IntentRouter::new(config.router.clone()),
            store,
            registry,
        }
    }

    /// The conversation store backing this orchestrator.
    pub fn store(&self) -> Arc<ConversationStore> {
        Arc::clone(&self.store)
    }

    /// Processes one document-generation request.
    ///
    /// Gets or creates the session, routes the text, executes the plan
    /// sequentially, and leaves the conversation awaiting feedback.
    /// Collaborator failures are normal results: `success` mirrors the
    /// primary result, but the conversation stays open so the user can
    /// retry or adjust. The error state is reserved for failures of the
    /// orchestration layer itself.
    #[instrument(skip(self, request_text, options))]
    pub async fn process_request(
        &self,
        session_id: Option<String>,
        request_text: &str,
        options: RequestOptions,
    ) -> DomainResult<OrchestratorResponse> {
        let session = self.store.create_session(session_id).await;
        if !session.can_accept_input() {
            return Err(DomainError::InvalidStateTransition {
                from: format!("{:?}", session.conversation_state),
                to: "processing".to_string(),
                reason: "session is closed to further input".to_string(),
            });
        }
        let sid = session.id.clone();

        self.store
            .add_message(
                &sid,
                Message::new(Sender::user(), MessageType::Request, request_text),
            )
            .await;
        if !session.metadata.contains_key("original_request") {
            self.store
                .set_session_metadata(&sid, "original_request", json!(request_text))
                .await;
        }
        self.store
            .set_conversation_state(&sid, ConversationState::Processing)
            .await;

        let routing = self.router.analyze(request_text);
        self.store
            .audit_log()
            .record(
                AuditEntry::new(&sid, AuditAction::RequestRouted, ResourceType::Session, &sid)
                    .with_detail("primary_agent", json!(routing.primary_agent))
                    .with_detail("secondary_agents", json!(routing.secondary_agents))
                    .with_detail("confidence", json!(routing.confidence_score)),
            )
            .await;

        let plan = self.build_plan(&routing, &options);
        debug!(session_id = %sid, ?plan, "executing plan");

        let mut results = Vec::with_capacity(plan.len());
        for agent in &plan {
            let result = self
                .execute_agent(*agent, &sid, request_text, &routing.extracted_data)
                .await;

            let note = match (result.success, &result.error) {
                (true, _) => format!("{agent} produced document content"),
                (false, Some(error)) => format!("{agent} failed: {error}"),
                (false, None) => format!("{agent} failed"),
            };
            self.store
                .add_message(
                    &sid,
                    Message::new(Sender::Agent(*agent), MessageType::Response, note)
                        .with_metadata("success", json!(result.success)),
                )
                .await;
            self.store.record_agent_result(&sid, result.clone()).await;
            results.push(result);
        }

        if let Some(primary) = plan.first() {
            self.store
                .set_session_metadata(&sid, "last_primary_agent", json!(primary))
                .await;
        }

        let primary_ok = results.first().is_some_and(|r| r.success);
        self.store
            .set_conversation_state(&sid, ConversationState::AwaitingFeedback)
            .await;

        let message = if primary_ok {
            results.first().and_then(|r| {
                let missing = r.missing_fields();
                (!missing.is_empty())
                    .then(|| format!("generated with default-filled fields: {}", missing.join(", ")))
            })
        } else {
            results.first().and_then(|r| r.error.clone())
        };

        let summary = ExecutionSummary::from_results(&results);
        let mut results = results.into_iter();
        let primary_result = results.next();
        let secondary_results: Vec<AgentResult> = results.collect();

        Ok(OrchestratorResponse {
            session_id: sid,
            success: primary_ok,
            conversation_state: ConversationState::AwaitingFeedback,
            routing: Some(routing),
            primary_result,
            secondary_results,
            summary,
            message,
        })
    }

    /// Handles one piece of user feedback against an existing session.
    ///
    /// Approval completes the conversation. Rejection and content updates
    /// re-invoke the responsible agent with the complaint folded into the
    /// request text. Knowledge updates create a pending record for the
    /// approve-then-implement workflow. Clarifications are logged only.
    #[instrument(skip(self, feedback), fields(feedback_id = %feedback.id))]
    pub async fn handle_feedback(&self, feedback: Feedback) -> DomainResult<OrchestratorResponse> {
        let session = self
            .store
            .get_session(&feedback.session_id)
            .await
            .ok_or_else(|| DomainError::SessionNotFound(feedback.session_id.clone()))?;
        if !session.can_accept_input() {
            return Err(DomainError::InvalidStateTransition {
                from: format!("{:?}", session.conversation_state),
                to: "processing".to_string(),
                reason: "session no longer accepts feedback".to_string(),
            });
        }

        let sid = session.id.clone();
        let feedback_id = feedback.id;
        let feedback_type = feedback.feedback_type;
        let target_agent = feedback.target_agent;
        let content = feedback.content.clone();

        self.store.add_feedback(feedback).await;
        self.store
            .add_message(
                &sid,
                Message::new(Sender::user(), MessageType::Feedback, &content)
                    .with_metadata("feedback_id", json!(feedback_id)),
            )
            .await;
        self.store
            .process_feedback(feedback_id, PROCESSOR, ReviewStatus::Processing, None)
            .await;

        match feedback_type {
            FeedbackType::Approval => {
                self.store
                    .process_feedback(
                        feedback_id,
                        PROCESSOR,
                        ReviewStatus::Approved,
                        Some("documents approved; conversation completed".to_string()),
                    )
                    .await;
                self.store
                    .set_conversation_state(&sid, ConversationState::Completed)
                    .await;
                Ok(self
                    .feedback_response(&sid, true, Some("documents approved".to_string()), None)
                    .await)
            }
            FeedbackType::Rejection | FeedbackType::ContentUpdate => {
                self.regenerate(&sid, &session.metadata, feedback_id, feedback_type, target_agent, &content)
                    .await
            }
            FeedbackType::KnowledgeUpdate => {
                let agent = self.responsible_agent(target_agent, &session.metadata, &content);
                let update = KnowledgeUpdate::new(&sid, "feedback", agent, &content)
                    .with_source_feedback(feedback_id);
                let update_id = self.store.create_knowledge_update(update).await;
                let resolution = update_id.map_or_else(
                    || "knowledge update could not be recorded".to_string(),
                    |id| format!("knowledge update {id} created, pending approval"),
                );
                self.store
                    .process_feedback(
                        feedback_id,
                        PROCESSOR,
                        if update_id.is_some() {
                            ReviewStatus::Approved
                        } else {
                            ReviewStatus::Failed
                        },
                        Some(resolution.clone()),
                    )
                    .await;
                self.store
                    .set_conversation_state(&sid, ConversationState::AwaitingFeedback)
                    .await;
                Ok(self
                    .feedback_response(&sid, update_id.is_some(), Some(resolution), None)
                    .await)
            }
            FeedbackType::Clarification => {
                debug!(session_id = %sid, "clarification logged, no side effect");
                self.store
                    .process_feedback(
                        feedback_id,
                        PROCESSOR,
                        ReviewStatus::Approved,
                        Some("clarification logged".to_string()),
                    )
                    .await;
                self.store
                    .set_conversation_state(&sid, ConversationState::AwaitingFeedback)
                    .await;
                Ok(self
                    .feedback_response(&sid, true, Some("clarification logged".to_string()), None)
                    .await)
            }
        }
    }

    /// Transport-facing feedback ingestion: attaches the feedback to an
    /// existing session or a fresh one, then handles it.
    #[instrument(skip(self, request))]
    pub async fn ingest_feedback(
        &self,
        request: IngestFeedbackRequest,
    ) -> DomainResult<IngestFeedbackResponse> {
        let session = self.store.create_session(request.session_id.clone()).await;
        let sid = session.id.clone();
        self.store
            .set_session_metadata(&sid, "domain", json!(request.domain))
            .await;

        let mut feedback = Feedback::new(
            &sid,
            request.feedback_type,
            &request.feedback_text,
            request.priority,
        );
        if let Some(agent) = request.target_agent {
            feedback = feedback.with_target(agent);
        }

        let insert_result = self.handle_feedback(feedback).await?;
        Ok(IngestFeedbackResponse {
            session_id: sid,
            insert_result,
        })
    }

    /// Maps free text onto a target agent's template placeholders.
    ///
    /// Every required field appears in the placeholder map, default-filled
    /// when extraction found nothing; optional fields appear only when
    /// extracted. Placeholder keys are `{{UPPER_SNAKE}}` forms of the
    /// capability field names.
    pub fn map_text(&self, text: &str, target: AgentType) -> FieldMapping {
        let routing = self.router.analyze(text);
        let extracted = routing.extracted_data;
        let capability = target.capability();

        let mut placeholders = HashMap::new();
        for field in capability.required_fields {
            let value = extracted
                .get(*field)
                .cloned()
                .unwrap_or_else(|| json!(DEFAULT_FIELD_VALUE));
            placeholders.insert(placeholder_key(field), value);
        }
        for field in capability.optional_fields {
            if let Some(value) = extracted.get(*field) {
                placeholders.insert(placeholder_key(field), value.clone());
            }
        }

        FieldMapping {
            extracted_fields: extracted,
            target_specific_placeholder_map: placeholders,
        }
    }

    /// Resolves the plan for one request: explicit tags win, then the
    /// run-everything flag, then the routed decomposition.
    fn build_plan(&self, routing: &RoutingDecision, options: &RequestOptions) -> Vec<AgentType> {
        if !options.explicit_agents.is_empty() {
            let mut plan = Vec::new();
            for tag in &options.explicit_agents {
                match AgentType::parse_str(tag) {
                    Some(agent) if !plan.contains(&agent) => plan.push(agent),
                    Some(_) => {}
                    None => warn!(tag, "dropping unknown agent tag"),
                }
            }
            if !plan.is_empty() {
                return plan;
            }
            warn!("no explicit agent tag parsed, using routed plan");
        }

        if options.run_all {
            return AgentType::ALL.to_vec();
        }

        let mut plan = vec![routing.primary_agent];
        plan.extend(routing.secondary_agents.iter().copied());
        plan
    }

    /// Executes one agent in isolation: a missing or failing collaborator
    /// becomes a failed `AgentResult`, never an error.
    async fn execute_agent(
        &self,
        agent: AgentType,
        session_id: &str,
        request_text: &str,
        extracted: &HashMap<String, serde_json::Value>,
    ) -> AgentResult {
        let capability = agent.capability();
        let mut fields = HashMap::new();
        let mut missing_fields = Vec::new();

        for field in capability.required_fields {
            match extracted.get(*field) {
                Some(value) => {
                    fields.insert((*field).to_string(), value.clone());
                }
                None => {
                    fields.insert((*field).to_string(), json!(DEFAULT_FIELD_VALUE));
                    missing_fields.push((*field).to_string());
                }
            }
        }
        for field in capability.optional_fields {
            if let Some(value) = extracted.get(*field) {
                fields.insert((*field).to_string(), value.clone());
            }
        }
        if !missing_fields.is_empty() {
            warn!(
                %agent,
                missing = ?missing_fields,
                "required fields default-filled before generation"
            );
        }

        let request = GenerationRequest {
            agent_type: agent,
            session_id: session_id.to_string(),
            request_text: request_text.to_string(),
            fields,
            missing_fields: missing_fields.clone(),
        };

        let started = Instant::now();
        let result = match self.registry.get(agent).await {
            None => AgentResult::failure(
                agent,
                AgentErrorKind::NotAvailable,
                format!("no collaborator registered for {agent}"),
                elapsed_ms(started),
            ),
            Some(collaborator) => {
                if collaborator.is_available().await {
                    let deadline = Duration::from_secs(self.timeout_secs);
                    match tokio::time::timeout(deadline, collaborator.generate(request)).await {
                        Ok(Ok(content)) => {
                            AgentResult::success(agent, content, elapsed_ms(started))
                        }
                        Ok(Err(error)) => {
                            let kind = match &error {
                                CollaboratorError::Validation(_) => AgentErrorKind::Validation,
                                CollaboratorError::Generation(_) => AgentErrorKind::Generation,
                                CollaboratorError::Timeout(_) => AgentErrorKind::Timeout,
                                CollaboratorError::NotAvailable(_) => AgentErrorKind::NotAvailable,
                            };
                            AgentResult::failure(agent, kind, error.to_string(), elapsed_ms(started))
                        }
                        Err(_) => AgentResult::failure(
                            agent,
                            AgentErrorKind::Timeout,
                            format!("timed out after {}s", self.timeout_secs),
                            elapsed_ms(started),
                        ),
                    }
                } else {
                    AgentResult::failure(
                        agent,
                        AgentErrorKind::NotAvailable,
                        format!("collaborator for {agent} reported unavailable"),
                        elapsed_ms(started),
                    )
                }
            }
        };

        if missing_fields.is_empty() {
            result
        } else {
            result
                .with_metadata("missing_fields", json!(missing_fields))
                .with_metadata("degraded", json!(true))
        }
    }

    /// Regenerates after a rejection or content update, with the complaint
    /// appended to the original request text.
    async fn regenerate(
        &self,
        sid: &str,
        session_metadata: &HashMap<String, serde_json::Value>,
        feedback_id: uuid::Uuid,
        feedback_type: FeedbackType,
        target_agent: Option<AgentType>,
        content: &str,
    ) -> DomainResult<OrchestratorResponse> {
        let annotation = if feedback_type == FeedbackType::Rejection {
            format!("[REJECTED: {content}]")
        } else {
            format!("[UPDATE: {content}]")
        };
        let base = session_metadata
            .get("original_request")
            .and_then(|v| v.as_str())
            .unwrap_or(content);
        let request_text = format!("{base}\n\n{annotation}");

        let agent = self.responsible_agent(target_agent, session_metadata, &request_text);
        self.store
            .set_conversation_state(sid, ConversationState::Processing)
            .await;

        let routing = self.router.analyze(&request_text);
        let result = self
            .execute_agent(agent, sid, &request_text, &routing.extracted_data)
            .await;
        self.store.record_agent_result(sid, result.clone()).await;
        self.store
            .add_message(
                sid,
                Message::new(
                    Sender::Agent(agent),
                    MessageType::Response,
                    if result.success {
                        format!("{agent} regenerated document content")
                    } else {
                        format!("{agent} regeneration failed")
                    },
                )
                .with_metadata("feedback_id", json!(feedback_id)),
            )
            .await;

        let success = result.success;
        if success {
            self.store
                .process_feedback(
                    feedback_id,
                    PROCESSOR,
                    ReviewStatus::Approved,
                    Some(format!("{agent} regenerated")),
                )
                .await;
        } else {
            self.store
                .process_feedback(feedback_id, PROCESSOR, ReviewStatus::Failed, result.error.clone())
                .await;
        }
        // The conversation stays open either way; the user can follow up.
        self.store
            .set_conversation_state(sid, ConversationState::AwaitingFeedback)
            .await;

        let message = result.error.clone();
        Ok(self
            .feedback_response(sid, success, message, Some(result))
            .await)
    }

    /// Picks the agent a piece of feedback is about: the explicit target,
    /// else the last primary agent, else a routing pass over the text.
    fn responsible_agent(
        &self,
        target_agent: Option<AgentType>,
        session_metadata: &HashMap<String, serde_json::Value>,
        text: &str,
    ) -> AgentType {
        target_agent
            .or_else(|| {
                session_metadata
                    .get("last_primary_agent")
                    .and_then(|v| v.as_str())
                    .and_then(AgentType::parse_str)
            })
            .unwrap_or_else(|| {
                let routed = self.router.analyze(text).primary_agent;
                debug!(agent = %routed, "no feedback target, routed from text");
                routed
            })
    }

    async fn feedback_response(
        &self,
        sid: &str,
        success: bool,
        message: Option<String>,
        primary_result: Option<AgentResult>,
    ) -> OrchestratorResponse {
        let conversation_state = self
            .store
            .get_session(sid)
            .await
            .map_or(ConversationState::Error, |s| s.conversation_state);
        let summary = primary_result
            .as_ref()
            .map(|r| ExecutionSummary::from_results(std::iter::once(r)))
            .unwrap_or_default();

        OrchestratorResponse {
            session_id: sid.to_string(),
            success,
            conversation_state,
            routing: None,
            primary_result,
            secondary_results: Vec::new(),
            summary,
            message,
        }
    }
}

fn placeholder_key(field: &str) -> String {
    format!("{{{{{}}}}}", field.to_uppercase())
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
