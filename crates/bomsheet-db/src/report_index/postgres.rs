use async_trait::async_trait;
use bomsheet_core::models::ReportMetadataRecord;
use bomsheet_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{IndexError, ReportIndex, ReportIndexEntry};

const COLUMNS: &str = "owner_id, artifact_id, customer_name, storage_key, storage_url, created_at";

/// PostgreSQL-backed report index
#[derive(Clone)]
pub struct PgReportIndex {
    pool: PgPool,
    table: String,
}

impl PgReportIndex {
    /// `table` is interpolated into SQL, so it must be a plain identifier.
    pub fn new(pool: PgPool, table: &str) -> Result<Self, AppError> {
        let is_identifier = table
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !is_identifier {
            return Err(AppError::Internal(format!(
                "invalid report table name: {}",
                table
            )));
        }
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }
}

#[async_trait]
impl ReportIndex for PgReportIndex {
    #[tracing::instrument(skip(self, entry), fields(
        db.system = "postgresql",
        db.table = %self.table,
        db.operation = "insert",
        db.record_id = %entry.artifact_id
    ))]
    async fn record(&self, entry: ReportIndexEntry) -> Result<ReportMetadataRecord, IndexError> {
        let sql = format!(
            "INSERT INTO {} (owner_id, artifact_id, customer_name, storage_key, storage_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            self.table, COLUMNS
        );

        sqlx::query_as::<Postgres, ReportMetadataRecord>(&sql)
            .bind(&entry.owner_id)
            .bind(entry.artifact_id)
            .bind(&entry.customer_name)
            .bind(&entry.storage_key)
            .bind(&entry.storage_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    IndexError::Duplicate {
                        owner_id: entry.owner_id.clone(),
                        artifact_id: entry.artifact_id,
                    }
                }
                other => IndexError::Database(other),
            })
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = %self.table,
        db.operation = "select"
    ))]
    async fn query_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<ReportMetadataRecord>, IndexError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE owner_id = $1 ORDER BY created_at DESC, artifact_id",
            COLUMNS, self.table
        );

        let records = sqlx::query_as::<Postgres, ReportMetadataRecord>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = %self.table,
        db.operation = "select",
        db.record_id = %artifact_id
    ))]
    async fn find(
        &self,
        owner_id: &str,
        artifact_id: Uuid,
    ) -> Result<Option<ReportMetadataRecord>, IndexError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE owner_id = $1 AND artifact_id = $2",
            COLUMNS, self.table
        );

        let record = sqlx::query_as::<Postgres, ReportMetadataRecord>(&sql)
            .bind(owner_id)
            .bind(artifact_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }
}
