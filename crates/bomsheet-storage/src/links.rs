//! Time-limited download links.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::traits::{Storage, StorageError, StorageResult};

/// Default link lifetime: one hour.
pub const DEFAULT_LINK_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedLink {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues GET links for stored artifacts that stop working after a fixed lifetime.
#[derive(Clone)]
pub struct LinkIssuer {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl LinkIssuer {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn issue(&self, storage_key: &str) -> StorageResult<IssuedLink> {
        let issued_at = Utc::now();
        let url = self
            .storage
            .presigned_get_url(storage_key, self.ttl)
            .await?;
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(IssuedLink {
            url,
            expires_at: issued_at + ttl,
        })
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use crate::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_issue_uses_configured_ttl() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost/files".to_string())
            .await
            .unwrap();
        let issuer = LinkIssuer::new(Arc::new(storage), DEFAULT_LINK_TTL);

        let before = Utc::now();
        let link = issuer.issue("owner/Acme_1.xlsx").await.unwrap();
        let after = Utc::now();

        assert!(link.url.starts_with("http://localhost/files/owner/Acme_1.xlsx?expires="));
        assert!(link.expires_at >= before + chrono::Duration::seconds(3600));
        assert!(link.expires_at <= after + chrono::Duration::seconds(3600));
    }
}
