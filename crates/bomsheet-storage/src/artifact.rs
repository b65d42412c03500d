//! Artifact store adapter: persists a rendered report under a fresh owner-scoped key.

use std::sync::Arc;

use uuid::Uuid;

use crate::keys::report_storage_key;
use crate::traits::{Storage, StorageResult};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Where a stored report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub artifact_id: Uuid,
    pub storage_key: String,
    pub storage_url: String,
}

#[derive(Clone)]
pub struct ArtifactStore {
    storage: Arc<dyn Storage>,
}

impl ArtifactStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Store a rendered workbook. Every call mints a new artifact id, so two stores for the
    /// same owner and customer never share a key.
    #[tracing::instrument(skip(self, document), fields(size_bytes = document.len()))]
    pub async fn store(
        &self,
        document: Vec<u8>,
        owner_id: &str,
        customer_name: &str,
    ) -> StorageResult<StoredArtifact> {
        let artifact_id = Uuid::new_v4();
        let storage_key = report_storage_key(owner_id, customer_name, artifact_id)?;

        let storage_url = self
            .storage
            .put_object(&storage_key, document, XLSX_CONTENT_TYPE)
            .await?;

        Ok(StoredArtifact {
            artifact_id,
            storage_key,
            storage_url,
        })
    }

    pub async fn fetch(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.storage.get_object(storage_key).await
    }
}
