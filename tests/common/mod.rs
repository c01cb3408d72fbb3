//! Shared test harness: an orchestrator wired to mock collaborators and a
//! temporary filesystem archive.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use docuforge::adapters::archive::FilesystemArchiver;
use docuforge::adapters::collaborators::MockCollaborator;
use docuforge::domain::models::AgentType;
use docuforge::services::{
    AuditLog, CollaboratorRegistry, Config, ConversationStore, Orchestrator,
};

pub struct TestHarness {
    pub orchestrator: Orchestrator,
    pub store: Arc<ConversationStore>,
    pub registry: Arc<CollaboratorRegistry>,
    pub collaborators: HashMap<AgentType, Arc<MockCollaborator>>,
    pub archive_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn archive_path(&self, session_id: &str) -> std::path::PathBuf {
        self.archive_dir.path().join(format!("{session_id}.json"))
    }
}

/// Harness with a mock collaborator registered for every agent type.
pub async fn full_harness() -> TestHarness {
    harness_with(AgentType::ALL).await
}

/// Harness with mock collaborators for the given agent types only.
pub async fn harness_with(agents: impl IntoIterator<Item = AgentType>) -> TestHarness {
    let config = Config::default();
    let archive_dir = tempfile::tempdir().expect("tempdir");

    let store = Arc::new(ConversationStore::new(
        Arc::new(AuditLog::new(config.audit.max_entries)),
        Arc::new(FilesystemArchiver::new(archive_dir.path())),
    ));

    let registry = Arc::new(CollaboratorRegistry::new());
    let mut collaborators = HashMap::new();
    for agent in agents {
        let collaborator = Arc::new(MockCollaborator::new(agent));
        registry.register(collaborator.clone()).await;
        collaborators.insert(agent, collaborator);
    }

    let orchestrator = Orchestrator::new(&config, Arc::clone(&store), Arc::clone(&registry));

    TestHarness {
        orchestrator,
        store,
        registry,
        collaborators,
        archive_dir,
    }
}
