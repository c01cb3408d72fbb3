//! Integration tests for the conversation store against the filesystem
//! archiver and the bounded audit log.

mod common;

use common::full_harness;
use serde_json::json;

use docuforge::adapters::archive::FilesystemArchiver;
use docuforge::domain::models::{
    AuditAction, AuditFilter, Feedback, FeedbackPriority, FeedbackType, Message, MessageType,
    ReviewStatus, Sender,
};
use docuforge::services::{AuditLog, ConversationStore};
use std::sync::Arc;

#[tokio::test]
async fn test_audit_cap_is_enforced_globally() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConversationStore::new(
        Arc::new(AuditLog::new(5)),
        Arc::new(FilesystemArchiver::new(dir.path())),
    );

    store.create_session(Some("s1".to_string())).await;
    for i in 0..10 {
        store
            .add_message(
                "s1",
                Message::new(Sender::user(), MessageType::Request, format!("msg {i}")),
            )
            .await;
    }

    let stats = store.statistics().await;
    assert_eq!(stats.total_messages, 10, "messages are never evicted");
    assert_eq!(stats.audit.total_entries, 5, "audit trail is bounded");

    // The creation entry was evicted; only the newest message entries remain
    let trail = store.audit_trail(&AuditFilter::new().with_session("s1")).await;
    assert!(trail
        .iter()
        .all(|e| e.action == AuditAction::MessageAdded));
}

#[tokio::test]
async fn test_audit_filters() {
    let harness = full_harness().await;
    harness.store.create_session(Some("s1".to_string())).await;
    harness.store.create_session(Some("s2".to_string())).await;
    harness
        .store
        .add_message(
            "s1",
            Message::new(Sender::user(), MessageType::Request, "hello"),
        )
        .await;

    let by_session = harness
        .store
        .audit_trail(&AuditFilter::new().with_session("s1"))
        .await;
    assert_eq!(by_session.len(), 2);

    let by_action = harness
        .store
        .audit_trail(&AuditFilter::new().with_action(AuditAction::SessionCreated))
        .await;
    assert_eq!(by_action.len(), 2);

    let limited = harness
        .store
        .audit_trail(&AuditFilter::new().with_limit(1))
        .await;
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].action, AuditAction::MessageAdded, "newest kept");
}

#[tokio::test]
async fn test_feedback_transition_guard_rails() {
    let harness = full_harness().await;
    harness.store.create_session(Some("s1".to_string())).await;

    let feedback = Feedback::new(
        "s1",
        FeedbackType::Rejection,
        "wrong numbers",
        FeedbackPriority::High,
    );
    let id = feedback.id;
    harness.store.add_feedback(feedback).await;

    // Pending -> Implemented is illegal
    assert!(
        !harness
            .store
            .process_feedback(id, "orchestrator", ReviewStatus::Implemented, None)
            .await
    );

    assert!(
        harness
            .store
            .process_feedback(id, "orchestrator", ReviewStatus::Rejected, None)
            .await
    );
    // Rejected is terminal
    assert!(
        !harness
            .store
            .process_feedback(id, "orchestrator", ReviewStatus::Approved, None)
            .await
    );
}

#[tokio::test]
async fn test_archive_artifact_round_trips() {
    let harness = full_harness().await;
    harness.store.create_session(Some("s1".to_string())).await;
    harness
        .store
        .add_message(
            "s1",
            Message::new(Sender::user(), MessageType::Request, "generate"),
        )
        .await;
    harness
        .store
        .set_session_metadata("s1", "domain", json!("structured-notes"))
        .await;

    assert!(harness.store.archive("s1").await.unwrap());
    // Archiving twice is a miss, not an error
    assert!(!harness.store.archive("s1").await.unwrap());

    let raw = std::fs::read(harness.archive_path("s1")).unwrap();
    let archived: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(archived["session"]["id"], json!("s1"));
    assert_eq!(
        archived["session"]["metadata"]["domain"],
        json!("structured-notes")
    );
    assert_eq!(
        archived["session"]["messages"][0]["content"],
        json!("generate")
    );
}

#[tokio::test]
async fn test_concurrent_sessions_are_isolated() {
    let harness = full_harness().await;
    let store = Arc::clone(&harness.store);

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let sid = format!("s{i}");
            store.create_session(Some(sid.clone())).await;
            for _ in 0..5 {
                store
                    .add_message(
                        &sid,
                        Message::new(Sender::user(), MessageType::Request, "msg"),
                    )
                    .await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = harness.store.statistics().await;
    assert_eq!(stats.active_sessions, 8);
    assert_eq!(stats.total_messages, 40);
    for i in 0..8 {
        let session = harness.store.get_session(&format!("s{i}")).await.unwrap();
        assert_eq!(session.messages.len(), 5);
    }
}
