//! Runtime registry of collaborator implementations.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use tracing::debug;

use crate::domain::models::AgentType;
use crate::domain::ports::Collaborator;

/// Maps agent types to the collaborator serving them.
///
/// Registration replaces any previous collaborator for the same agent type.
#[derive(Default)]
pub struct CollaboratorRegistry {
    collaborators: RwLock<HashMap<AgentType, Arc<dyn Collaborator>>>,
}

impl CollaboratorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collaborator under its own agent type.
    pub async fn register(&self, collaborator: Arc<dyn Collaborator>) {
        let agent_type = collaborator.agent_type();
        debug!(agent = %agent_type, "registering collaborator");
        self.collaborators
            .write()
            .await
            .insert(agent_type, collaborator);
    }

    /// Removes the collaborator for an agent type, returning it if present.
    pub async fn unregister(&self, agent_type: AgentType) -> Option<Arc<dyn Collaborator>> {
        self.collaborators.write().await.remove(&agent_type)
    }

    /// Looks up the collaborator for an agent type.
    pub async fn get(&self, agent_type: AgentType) -> Option<Arc<dyn Collaborator>> {
        self.collaborators.read().await.get(&agent_type).cloned()
    }

    /// Agent types with a registered collaborator.
    pub async fn registered_agents(&self) -> Vec<AgentType> {
        let collaborators = self.collaborators.read().await;
        AgentType::ALL
            .into_iter()
            .filter(|agent| collaborators.contains_key(agent))
            .collect()
    }

    /// Number of registered collaborators.
    pub async fn len(&self) -> usize {
        self.collaborators.read().await.len()
    }

    /// Whether no collaborators are registered.
    pub async fn is_empty(&self) -> bool {
        self.collaborators.read().await.is_empty()
    }
}
