//! Agent execution results and orchestrator response types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::capability::AgentType;
use super::routing::RoutingDecision;
use super::session::ConversationState;

/// The kind of failure an agent execution can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentErrorKind {
    /// Collaborator rejected the input record
    Validation,
    /// Collaborator failed while producing the document
    Generation,
    /// Collaborator call exceeded the configured timeout
    Timeout,
    /// No collaborator registered for the agent type
    NotAvailable,
}

/// Outcome of one collaborator execution.
///
/// A failed execution is a normal value, never an error: one collaborator's
/// failure must not stop the rest of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Agent that was executed.
    pub agent_type: AgentType,
    /// Whether the collaborator produced a document.
    pub success: bool,
    /// Opaque document content on success.
    pub content: Option<serde_json::Value>,
    /// Error description on failure.
    pub error: Option<String>,
    /// Failure classification on failure.
    pub error_kind: Option<AgentErrorKind>,
    /// Wall-clock execution time in milliseconds.
    pub processing_time_ms: u64,
    /// Execution metadata; `missing_fields` lists required fields that were
    /// default-filled, and `degraded` is true when that list is non-empty.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AgentResult {
    /// A successful execution.
    pub fn success(agent_type: AgentType, content: serde_json::Value, elapsed_ms: u64) -> Self {
        Self {
            agent_type,
            success: true,
            content: Some(content),
            error: None,
            error_kind: None,
            processing_time_ms: elapsed_ms,
            metadata: HashMap::new(),
        }
    }

    /// A failed execution.
    pub fn failure(
        agent_type: AgentType,
        kind: AgentErrorKind,
        error: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            agent_type,
            success: false,
            content: None,
            error: Some(error.into()),
            error_kind: Some(kind),
            processing_time_ms: elapsed_ms,
            metadata: HashMap::new(),
        }
    }

    /// Adds one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Required fields that were default-filled before execution.
    pub fn missing_fields(&self) -> Vec<String> {
        self.metadata
            .get("missing_fields")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Per-agent outcome line in the aggregate summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    /// Whether the agent succeeded.
    pub success: bool,
    /// Execution time in milliseconds.
    pub processing_time_ms: u64,
    /// Error description on failure.
    pub error: Option<String>,
}

/// Aggregate view over every agent executed in one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// How many agents were in the plan.
    pub total_agents: usize,
    /// How many succeeded.
    pub succeeded: usize,
    /// Per-agent outcome map.
    pub results: HashMap<AgentType, AgentOutcome>,
}

impl ExecutionSummary {
    /// Builds the summary from the primary and secondary results.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a AgentResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total_agents += 1;
            if result.success {
                summary.succeeded += 1;
            }
            summary.results.insert(
                result.agent_type,
                AgentOutcome {
                    success: result.success,
                    processing_time_ms: result.processing_time_ms,
                    error: result.error.clone(),
                },
            );
        }
        summary
    }
}

/// Response returned by `process_request` and `handle_feedback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorResponse {
    /// Session the call operated on.
    pub session_id: String,
    /// For requests: the primary agent's outcome. For feedback: whether the
    /// branch completed.
    pub success: bool,
    /// Conversation state after the call.
    pub conversation_state: ConversationState,
    /// Routing decision, when a routing pass ran.
    pub routing: Option<RoutingDecision>,
    /// Result of the first plan entry.
    pub primary_result: Option<AgentResult>,
    /// Results of the remaining plan entries, in plan order.
    pub secondary_results: Vec<AgentResult>,
    /// Aggregate counts and per-agent outcomes.
    pub summary: ExecutionSummary,
    /// Human-readable status note.
    pub message: Option<String>,
}

/// Transport-facing feedback ingestion request. The transport layer itself
/// lives outside this crate; this is the contract it fills in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFeedbackRequest {
    /// Business domain tag, recorded on the session.
    pub domain: String,
    /// The feedback text.
    pub feedback_text: String,
    /// Kind of feedback.
    pub feedback_type: super::feedback::FeedbackType,
    /// Agent the feedback targets, if any.
    pub target_agent: Option<AgentType>,
    /// Urgency.
    #[serde(default)]
    pub priority: super::feedback::FeedbackPriority,
    /// Existing session to attach to; a fresh session is created when absent.
    pub session_id: Option<String>,
}

/// Result of feedback ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFeedbackResponse {
    /// Session the feedback landed on.
    pub session_id: String,
    /// The full feedback-handling response.
    pub insert_result: OrchestratorResponse,
}

/// Result of the natural-language mapping entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Flattened extracted fields.
    pub extracted_fields: HashMap<String, serde_json::Value>,
    /// Target-specific placeholder map, `{{UPPER_SNAKE}}` keyed by the
    /// target agent's capability fields.
    pub target_specific_placeholder_map: HashMap<String, serde_json::Value>,
}
