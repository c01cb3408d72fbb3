//! Bounded append-only audit log.
//!
//! One global sequence for the whole store, capped with FIFO eviction.
//! Supports structured querying for post-hoc analysis and debugging.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::models::{AuditEntry, AuditFilter};

/// Default global cap on retained entries.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Statistics about the audit log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditStats {
    pub total_entries: usize,
    pub by_action: HashMap<String, usize>,
    pub by_resource_type: HashMap<String, usize>,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

/// In-memory audit log as a bounded ring.
pub struct AuditLog {
    max_entries: usize,
    entries: Arc<RwLock<VecDeque<AuditEntry>>>,
}

impl AuditLog {
    /// Creates an audit log with the given cap.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            entries: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    /// Creates an audit log with the default cap.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }

    /// Appends an entry, evicting the oldest once the cap is exceeded.
    pub async fn record(&self, entry: AuditEntry) {
        let mut entries = self.entries.write().await;
        while entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Queries entries matching a filter, oldest first.
    pub async fn query(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        let mut results: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();

        if let Some(limit) = filter.limit {
            // Keep the most recent entries when truncating
            if results.len() > limit {
                results.drain(..results.len() - limit);
            }
        }

        results
    }

    /// Every retained entry for one session, oldest first.
    pub async fn for_session(&self, session_id: &str) -> Vec<AuditEntry> {
        self.query(&AuditFilter::new().with_session(session_id)).await
    }

    /// Current number of retained entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the log is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Aggregate statistics.
    pub async fn stats(&self) -> AuditStats {
        let entries = self.entries.read().await;

        let mut by_action: HashMap<String, usize> = HashMap::new();
        let mut by_resource_type: HashMap<String, usize> = HashMap::new();
        for entry in entries.iter() {
            *by_action.entry(entry.action.as_str().to_string()).or_default() += 1;
            *by_resource_type
                .entry(entry.resource_type.as_str().to_string())
                .or_default() += 1;
        }

        AuditStats {
            total_entries: entries.len(),
            by_action,
            by_resource_type,
            oldest_entry: entries.front().map(|e| e.timestamp),
            newest_entry: entries.back().map(|e| e.timestamp),
        }
    }

    /// Exports matching entries as pretty JSON.
    pub async fn export_json(&self, filter: &AuditFilter) -> String {
        let entries = self.query(filter).await;
        serde_json::to_string_pretty(&entries).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AuditAction, ResourceType};

    fn entry(session: &str, action: AuditAction) -> AuditEntry {
        AuditEntry::new(session, action, ResourceType::Session, session)
    }

    #[tokio::test]
    async fn test_record_and_query() {
        let log = AuditLog::with_defaults();

        log.record(entry("s1", AuditAction::SessionCreated)).await;
        log.record(entry("s1", AuditAction::MessageAdded)).await;
        log.record(entry("s2", AuditAction::SessionCreated)).await;

        assert_eq!(log.len().await, 3);
        assert_eq!(log.for_session("s1").await.len(), 2);

        let created = log
            .query(&AuditFilter::new().with_action(AuditAction::SessionCreated))
            .await;
        assert_eq!(created.len(), 2);
    }

    #[tokio::test]
    async fn test_cap_evicts_oldest_first() {
        let log = AuditLog::new(3);

        for i in 0..5 {
            log.record(entry(&format!("s{i}"), AuditAction::SessionCreated))
                .await;
        }

        assert_eq!(log.len().await, 3);
        // s0 and s1 were evicted
        assert!(log.for_session("s0").await.is_empty());
        assert!(log.for_session("s1").await.is_empty());
        assert_eq!(log.for_session("s4").await.len(), 1);
    }

    #[tokio::test]
    async fn test_query_limit_keeps_newest() {
        let log = AuditLog::with_defaults();
        log.record(entry("s1", AuditAction::SessionCreated)).await;
        log.record(entry("s1", AuditAction::MessageAdded)).await;
        log.record(entry("s1", AuditAction::SessionArchived)).await;

        let limited = log.query(&AuditFilter::new().with_limit(2)).await;
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[1].action, AuditAction::SessionArchived);
    }

    #[tokio::test]
    async fn test_stats() {
        let log = AuditLog::with_defaults();
        assert!(log.is_empty().await);

        log.record(entry("s1", AuditAction::SessionCreated)).await;
        log.record(entry("s1", AuditAction::SessionCreated)).await;
        log.record(entry("s1", AuditAction::SessionArchived)).await;

        let stats = log.stats().await;
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.by_action["session_created"], 2);
        assert!(stats.oldest_entry.is_some());
    }
}
