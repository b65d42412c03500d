mod memory;
mod postgres;

pub use memory::MemoryReportIndex;
pub use postgres::PgReportIndex;

use std::sync::Arc;

use async_trait::async_trait;
use bomsheet_core::models::ReportMetadataRecord;
use bomsheet_core::{AppError, Config, IndexBackend};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record already exists for owner {owner_id} and artifact {artifact_id}")]
    Duplicate { owner_id: String, artifact_id: Uuid },

    #[error("index unavailable: {0}")]
    Unavailable(String),
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        AppError::Index(err.to_string())
    }
}

/// Fields supplied by the pipeline when recording a stored artifact.
#[derive(Debug, Clone)]
pub struct ReportIndexEntry {
    pub owner_id: String,
    pub artifact_id: Uuid,
    pub customer_name: String,
    pub storage_key: String,
    pub storage_url: Option<String>,
}

#[async_trait]
pub trait ReportIndex: Send + Sync {
    /// Record a stored artifact. `created_at` is assigned by the index.
    async fn record(&self, entry: ReportIndexEntry) -> Result<ReportMetadataRecord, IndexError>;

    /// All records for one owner, newest first.
    async fn query_by_owner(&self, owner_id: &str)
        -> Result<Vec<ReportMetadataRecord>, IndexError>;

    /// A single record, only if it belongs to `owner_id`.
    async fn find(
        &self,
        owner_id: &str,
        artifact_id: Uuid,
    ) -> Result<Option<ReportMetadataRecord>, IndexError>;
}

/// Build the configured index. The Postgres backend requires a pool.
pub fn create_report_index(
    config: &Config,
    pool: Option<PgPool>,
) -> Result<Arc<dyn ReportIndex>, AppError> {
    match config.index_backend() {
        IndexBackend::Postgres => {
            let pool = pool.ok_or_else(|| {
                AppError::Internal("postgres index backend requires a database pool".to_string())
            })?;
            tracing::info!(table = %config.report_table(), "Initializing PostgreSQL report index");
            Ok(Arc::new(PgReportIndex::new(pool, config.report_table())?))
        }
        IndexBackend::Memory => {
            tracing::warn!("Using in-memory report index; records are lost on restart");
            Ok(Arc::new(MemoryReportIndex::new()))
        }
    }
}
