//! Routing decision types produced by the intent router.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::capability::AgentType;

/// Priority of a subtask in the decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskPriority {
    High,
    Medium,
    Low,
}

/// One entry in the task decomposition: which agent runs and what it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    /// Agent that should execute this subtask.
    pub agent_type: AgentType,
    /// High for the primary agent, medium for secondaries.
    pub priority: SubtaskPriority,
    /// Required field names from the agent's capability row.
    pub required_fields: Vec<String>,
    /// Optional field names from the agent's capability row.
    pub optional_fields: Vec<String>,
}

impl Subtask {
    /// Builds a subtask from an agent's capability row.
    pub fn for_agent(agent_type: AgentType, priority: SubtaskPriority) -> Self {
        let cap = agent_type.capability();
        Self {
            agent_type,
            priority,
            required_fields: cap.required_fields.iter().map(|f| (*f).to_string()).collect(),
            optional_fields: cap.optional_fields.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}

/// The router's mapping of free text to one or more collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Best-scoring agent (or the configured fallback).
    pub primary_agent: AgentType,
    /// Other agents whose score cleared the secondary threshold.
    pub secondary_agents: Vec<AgentType>,
    /// Flattened extracted fields.
    pub extracted_data: HashMap<String, serde_json::Value>,
    /// Confidence in the routing, clamped to [0, 1].
    pub confidence_score: f64,
    /// Human-readable explanation; descriptive only.
    pub reasoning: String,
    /// Ordered execution plan, primary first.
    pub task_decomposition: Vec<Subtask>,
}

impl RoutingDecision {
    /// Advisory validity check: confident enough, and at least one of the
    /// primary agent's required fields was actually extracted.
    ///
    /// Callers may use this to flag degraded routings; `analyze` does not
    /// enforce it.
    pub fn is_valid(&self) -> bool {
        if self.confidence_score < 0.1 {
            return false;
        }
        self.primary_agent
            .capability()
            .required_fields
            .iter()
            .any(|field| self.extracted_data.contains_key(*field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subtask_carries_capability_fields() {
        let subtask = Subtask::for_agent(AgentType::InvestorSummary, SubtaskPriority::High);
        assert_eq!(subtask.required_fields, vec!["issuer", "product_name"]);
        assert!(subtask.optional_fields.contains(&"currency".to_string()));
    }

    #[test]
    fn test_is_valid_requires_confidence() {
        let decision = RoutingDecision {
            primary_agent: AgentType::InvestorSummary,
            secondary_agents: vec![],
            extracted_data: HashMap::from([("issuer".to_string(), json!("Acme"))]),
            confidence_score: 0.05,
            reasoning: String::new(),
            task_decomposition: vec![],
        };
        assert!(!decision.is_valid());
    }

    #[test]
    fn test_is_valid_requires_a_primary_required_field() {
        let mut decision = RoutingDecision {
            primary_agent: AgentType::InvestorSummary,
            secondary_agents: vec![],
            extracted_data: HashMap::from([("currency".to_string(), json!("USD"))]),
            confidence_score: 0.9,
            reasoning: String::new(),
            task_decomposition: vec![],
        };
        assert!(!decision.is_valid());

        decision
            .extracted_data
            .insert("issuer".to_string(), json!("Acme"));
        assert!(decision.is_valid());
    }
}
