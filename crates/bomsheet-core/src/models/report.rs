use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::bom::BomDocument;

/// A decoded, validated generate request.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// Verified identity of the caller.
    pub owner_id: String,
    /// Trimmed customer name as supplied (sanitized only when building keys).
    pub customer_name: String,
    pub cost_document: BomDocument,
    pub image: Option<Vec<u8>>,
    pub reference_link: Option<String>,
}

/// Index record describing one stored report artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReportMetadataRecord {
    pub owner_id: String,
    pub artifact_id: Uuid,
    pub customer_name: String,
    pub storage_key: String,
    /// Non-expiring object location, kept for operators; never handed to clients.
    pub storage_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One entry of a list response, with a freshly minted link.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportFileEntry {
    pub owner_id: String,
    pub artifact_id: Uuid,
    pub customer_name: String,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
    pub presigned_url: String,
    pub expires_at: DateTime<Utc>,
}

impl ReportFileEntry {
    pub fn from_record(
        record: ReportMetadataRecord,
        presigned_url: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: record.owner_id,
            artifact_id: record.artifact_id,
            customer_name: record.customer_name,
            storage_key: record.storage_key,
            created_at: record.created_at,
            presigned_url,
            expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListReportsResponse {
    pub files: Vec<ReportFileEntry>,
}

/// Body returned by a generate call in link mode.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateReportResponse {
    pub message: String,
    pub artifact_id: Uuid,
    pub customer_name: String,
    pub storage_key: String,
    pub file_url: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// False when the artifact was stored but the index write failed; it will not
    /// show up in list results.
    pub indexed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
