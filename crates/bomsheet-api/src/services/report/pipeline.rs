//! The generate pipeline and the owner-scoped read paths.
//!
//! Generate runs its stages strictly in order:
//! decoding → validating → building_table → rendering → storing → indexing → issuing_link.
//! Any stage error ends the run and is tagged with that stage. Two outcomes are not
//! terminal: an image that cannot be embedded (a render warning) and a failed index write
//! after the artifact was stored (reported with `indexed: false`).

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use bomsheet_core::models::{
    ListReportsResponse, ReportFileEntry, ReportMetadataRecord, ReportRequest,
};
use bomsheet_core::{AppError, PipelineOptions, PipelineStage, ResponseMode};
use bomsheet_db::{ReportIndex, ReportIndexEntry};
use bomsheet_report::{render_report, CostTable, RenderOptions, RenderedReport};
use bomsheet_storage::{ArtifactStore, IssuedLink, LinkIssuer, Storage, StoredArtifact};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::decoder::{decode_request, RawReportInput};
use crate::auth::OwnerContext;

/// Result of a successful generate run.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub artifact_id: Uuid,
    pub customer_name: String,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
    pub indexed: bool,
    pub warnings: Vec<String>,
    /// Present in link mode.
    pub link: Option<IssuedLink>,
    /// Present in bytes mode.
    pub document: Option<Vec<u8>>,
}

/// A stored artifact fetched for its owner.
#[derive(Debug, Clone)]
pub struct ReportDownload {
    pub record: ReportMetadataRecord,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ReportService {
    artifacts: ArtifactStore,
    index: Arc<dyn ReportIndex>,
    links: LinkIssuer,
    options: PipelineOptions,
}

/// Run one stage, timing it and tagging any failure with the stage.
async fn run_stage<T, F>(stage: PipelineStage, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    let start = Instant::now();
    let result = fut.await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    match result {
        Ok(value) => {
            tracing::debug!(stage = %stage, duration_ms, "Stage complete");
            Ok(value)
        }
        Err(e) => {
            tracing::debug!(stage = %stage, duration_ms, error = %e, "Stage failed");
            Err(e.at_stage(stage))
        }
    }
}

impl ReportService {
    pub fn new(
        storage: Arc<dyn Storage>,
        index: Arc<dyn ReportIndex>,
        link_ttl: std::time::Duration,
        options: PipelineOptions,
    ) -> Self {
        Self {
            artifacts: ArtifactStore::new(storage.clone()),
            index,
            links: LinkIssuer::new(storage, link_ttl),
            options,
        }
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        self.artifacts.storage()
    }

    /// Decode, validate and run a generate request end to end.
    #[tracing::instrument(skip_all, fields(owner_id = %owner.owner_id, response_mode = ?response_mode))]
    pub async fn generate_from_request(
        &self,
        owner: &OwnerContext,
        request: Request,
        response_mode: ResponseMode,
    ) -> Result<GenerateOutcome, AppError> {
        let raw = run_stage(PipelineStage::Decoding, decode_request(request)).await?;
        self.generate(owner, raw, response_mode).await
    }

    /// Run the pipeline from already-decoded fields.
    pub async fn generate(
        &self,
        owner: &OwnerContext,
        raw: RawReportInput,
        response_mode: ResponseMode,
    ) -> Result<GenerateOutcome, AppError> {
        let request = run_stage(PipelineStage::Validating, async {
            raw.validate(&owner.owner_id)
        })
        .await?;

        let ReportRequest {
            owner_id,
            customer_name,
            cost_document,
            image,
            reference_link,
        } = request;

        let table = run_stage(PipelineStage::BuildingTable, async {
            CostTable::build(&cost_document, reference_link.as_deref()).map_err(AppError::from)
        })
        .await?;
        tracing::debug!(
            rows = table.row_count(),
            total_monthly = %table.total_monthly,
            "Cost table built"
        );

        let render_options = RenderOptions::from(self.options);
        let RenderedReport { bytes, warnings } = run_stage(PipelineStage::Rendering, async move {
            tokio::task::spawn_blocking(move || {
                render_report(&table, image.as_deref(), render_options)
            })
            .await
            .map_err(|e| AppError::Render(format!("render task failed: {}", e)))?
            .map_err(AppError::from)
        })
        .await?;
        let mut warnings = warnings;

        // Bytes mode hands the rendered workbook back directly.
        let document = (response_mode == ResponseMode::Bytes).then(|| bytes.clone());

        let StoredArtifact {
            artifact_id,
            storage_key,
            storage_url,
        } = run_stage(PipelineStage::Storing, async {
            self.artifacts
                .store(bytes, &owner_id, &customer_name)
                .await
                .map_err(AppError::from)
        })
        .await?;
        tracing::info!(
            artifact_id = %artifact_id,
            storage_key = %storage_key,
            "Report artifact stored"
        );

        let entry = ReportIndexEntry {
            owner_id: owner_id.clone(),
            artifact_id,
            customer_name: customer_name.clone(),
            storage_key: storage_key.clone(),
            storage_url: Some(storage_url),
        };
        let (created_at, indexed) = match run_stage(PipelineStage::Indexing, async {
            self.index.record(entry).await.map_err(AppError::from)
        })
        .await
        {
            Ok(record) => (record.created_at, true),
            Err(e) => {
                // The artifact stays in storage; it is not listed until indexed.
                tracing::error!(
                    error = %e,
                    artifact_id = %artifact_id,
                    storage_key = %storage_key,
                    "Report stored but index write failed"
                );
                warnings.push(format!(
                    "report stored but not indexed; it will not appear in listings ({})",
                    e.root()
                ));
                (Utc::now(), false)
            }
        };

        let link = match response_mode {
            ResponseMode::Link => Some(
                run_stage(PipelineStage::IssuingLink, async {
                    self.links.issue(&storage_key).await.map_err(AppError::from)
                })
                .await?,
            ),
            ResponseMode::Bytes => None,
        };

        tracing::info!(
            artifact_id = %artifact_id,
            indexed,
            warnings = warnings.len(),
            "Report generated"
        );

        Ok(GenerateOutcome {
            artifact_id,
            customer_name,
            storage_key,
            created_at,
            indexed,
            warnings,
            link,
            document,
        })
    }

    /// Every report the owner has generated, each with a freshly issued link.
    #[tracing::instrument(skip(self), fields(owner_id = %owner.owner_id))]
    pub async fn list(&self, owner: &OwnerContext) -> Result<ListReportsResponse, AppError> {
        let records = self.index.query_by_owner(&owner.owner_id).await?;

        let mut files = Vec::with_capacity(records.len());
        for record in records {
            let link = self.links.issue(&record.storage_key).await?;
            files.push(ReportFileEntry::from_record(record, link.url, link.expires_at));
        }

        tracing::debug!(count = files.len(), "Listed reports");
        Ok(ListReportsResponse { files })
    }

    /// Fetch one stored report. Unknown ids and other owners' ids are both not found.
    #[tracing::instrument(skip(self), fields(owner_id = %owner.owner_id))]
    pub async fn download(
        &self,
        owner: &OwnerContext,
        artifact_id: Uuid,
    ) -> Result<ReportDownload, AppError> {
        let record = self
            .index
            .find(&owner.owner_id, artifact_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("report {}", artifact_id)))?;

        let bytes = self.artifacts.fetch(&record.storage_key).await?;

        Ok(ReportDownload { record, bytes })
    }
}
