use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bomsheet_core::models::ReportMetadataRecord;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{IndexError, ReportIndex, ReportIndexEntry};

/// In-process index keyed by owner id. Used for local runs and tests.
#[derive(Clone, Default)]
pub struct MemoryReportIndex {
    records: Arc<RwLock<HashMap<String, Vec<ReportMetadataRecord>>>>,
}

impl MemoryReportIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportIndex for MemoryReportIndex {
    async fn record(&self, entry: ReportIndexEntry) -> Result<ReportMetadataRecord, IndexError> {
        let mut records = self.records.write().await;
        let owned = records.entry(entry.owner_id.clone()).or_default();

        if owned.iter().any(|r| r.artifact_id == entry.artifact_id) {
            return Err(IndexError::Duplicate {
                owner_id: entry.owner_id,
                artifact_id: entry.artifact_id,
            });
        }

        let record = ReportMetadataRecord {
            owner_id: entry.owner_id,
            artifact_id: entry.artifact_id,
            customer_name: entry.customer_name,
            storage_key: entry.storage_key,
            storage_url: entry.storage_url,
            created_at: Utc::now(),
        };
        owned.push(record.clone());
        Ok(record)
    }

    async fn query_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<ReportMetadataRecord>, IndexError> {
        let records = self.records.read().await;
        let mut owned = records.get(owner_id).cloned().unwrap_or_default();
        // Insertion order breaks created_at ties, newest first.
        owned.reverse();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find(
        &self,
        owner_id: &str,
        artifact_id: Uuid,
    ) -> Result<Option<ReportMetadataRecord>, IndexError> {
        let records = self.records.read().await;
        Ok(records
            .get(owner_id)
            .and_then(|owned| owned.iter().find(|r| r.artifact_id == artifact_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(owner_id: &str, customer_name: &str) -> ReportIndexEntry {
        let artifact_id = Uuid::new_v4();
        ReportIndexEntry {
            owner_id: owner_id.to_string(),
            artifact_id,
            customer_name: customer_name.to_string(),
            storage_key: format!("{}/{}_{}.xlsx", owner_id, customer_name, artifact_id),
            storage_url: None,
        }
    }

    #[tokio::test]
    async fn test_query_is_owner_scoped() {
        let index = MemoryReportIndex::new();
        index.record(entry("alice", "Acme")).await.unwrap();
        index.record(entry("alice", "Globex")).await.unwrap();
        index.record(entry("bob", "Initech")).await.unwrap();

        let alice = index.query_by_owner("alice").await.unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|r| r.owner_id == "alice"));

        let bob = index.query_by_owner("bob").await.unwrap();
        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0].customer_name, "Initech");

        assert!(index.query_by_owner("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_newest_first() {
        let index = MemoryReportIndex::new();
        let first = index.record(entry("alice", "First")).await.unwrap();
        let second = index.record(entry("alice", "Second")).await.unwrap();

        let listed = index.query_by_owner("alice").await.unwrap();
        assert_eq!(listed[0].artifact_id, second.artifact_id);
        assert_eq!(listed[1].artifact_id, first.artifact_id);
    }

    #[tokio::test]
    async fn test_find_requires_matching_owner() {
        let index = MemoryReportIndex::new();
        let record = index.record(entry("alice", "Acme")).await.unwrap();

        assert!(index
            .find("alice", record.artifact_id)
            .await
            .unwrap()
            .is_some());
        assert!(index.find("bob", record.artifact_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_artifact_is_rejected() {
        let index = MemoryReportIndex::new();
        let e = entry("alice", "Acme");
        index.record(e.clone()).await.unwrap();
        let err = index.record(e).await.unwrap_err();
        assert!(matches!(err, IndexError::Duplicate { .. }));
    }
}
