//! Mock collaborator for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::models::AgentType;
use crate::domain::ports::{Collaborator, CollaboratorError, GenerationRequest};

/// Mock generation configuration.
#[derive(Debug, Clone)]
pub struct MockGeneration {
    /// Content returned on success; the request fields are merged in under
    /// `"fields"` so tests can assert on what the collaborator received.
    pub content: serde_json::Value,
    /// Whether to simulate failure
    pub fail: bool,
    /// Error returned when failing
    pub error: Option<CollaboratorError>,
    /// Simulated generation latency
    pub delay: Option<Duration>,
}

impl Default for MockGeneration {
    fn default() -> Self {
        Self {
            content: serde_json::json!({"body": "Mock document content."}),
            fail: false,
            error: None,
            delay: None,
        }
    }
}

impl MockGeneration {
    pub fn success(content: serde_json::Value) -> Self {
        Self {
            content,
            ..Default::default()
        }
    }

    pub fn failure(error: CollaboratorError) -> Self {
        Self {
            fail: true,
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Mock collaborator for testing.
pub struct MockCollaborator {
    agent_type: AgentType,
    available: bool,
    default_generation: MockGeneration,
    generation_overrides: Arc<RwLock<HashMap<String, MockGeneration>>>,
    requests: Arc<RwLock<Vec<GenerationRequest>>>,
}

impl MockCollaborator {
    pub fn new(agent_type: AgentType) -> Self {
        Self {
            agent_type,
            available: true,
            default_generation: MockGeneration::default(),
            generation_overrides: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_generation(agent_type: AgentType, generation: MockGeneration) -> Self {
        Self {
            default_generation: generation,
            ..Self::new(agent_type)
        }
    }

    pub fn unavailable(agent_type: AgentType) -> Self {
        Self {
            available: false,
            ..Self::new(agent_type)
        }
    }

    /// Set a specific generation outcome for one session.
    pub async fn set_generation_for_session(
        &self,
        session_id: impl Into<String>,
        generation: MockGeneration,
    ) {
        let mut overrides = self.generation_overrides.write().await;
        overrides.insert(session_id.into(), generation);
    }

    /// Every request this collaborator has received, in order.
    pub async fn received_requests(&self) -> Vec<GenerationRequest> {
        self.requests.read().await.clone()
    }

    /// Clear the recorded requests.
    pub async fn clear(&self) {
        self.requests.write().await.clear();
    }

    async fn generation_for(&self, session_id: &str) -> MockGeneration {
        let overrides = self.generation_overrides.read().await;
        overrides
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| self.default_generation.clone())
    }
}

#[async_trait]
impl Collaborator for MockCollaborator {
    fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<serde_json::Value, CollaboratorError> {
        let generation = self.generation_for(&request.session_id).await;
        self.requests.write().await.push(request.clone());

        if let Some(delay) = generation.delay {
            tokio::time::sleep(delay).await;
        }
        if generation.fail {
            return Err(generation
                .error
                .unwrap_or_else(|| CollaboratorError::Generation("mock failure".to_string())));
        }

        let mut content = generation.content;
        if let Some(object) = content.as_object_mut() {
            object.insert(
                "fields".to_string(),
                serde_json::to_value(&request.fields).unwrap_or_default(),
            );
        }
        Ok(content)
    }
}
