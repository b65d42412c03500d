use crate::auth::OwnerContext;
use crate::constants::{ARTIFACT_ID_HEADER, WARNINGS_HEADER, XLSX_CONTENT_TYPE};
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::report::GenerateOutcome;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use bomsheet_core::models::{GenerateReportResponse, ListReportsResponse};
use bomsheet_core::{AppError, ResponseMode};
use bomsheet_storage::keys::report_file_name;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

const GENERATED_MESSAGE: &str = "Report generated and stored successfully";

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    /// `link` (default) or `bytes`
    pub response: Option<String>,
}

/// An explicit `?response=` wins over the Accept header; otherwise the configured default.
fn select_response_mode(
    query: &GenerateQuery,
    headers: &HeaderMap,
    default_mode: ResponseMode,
) -> Result<ResponseMode, AppError> {
    if let Some(raw) = query.response.as_deref() {
        return raw.parse::<ResponseMode>().map_err(|_| {
            AppError::validation(
                vec!["response".to_string()],
                format!("Unknown response mode '{}'; expected link or bytes", raw),
            )
        });
    }

    let wants_xlsx = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| {
            accept
                .split(',')
                .any(|part| part.split(';').next().unwrap_or("").trim() == XLSX_CONTENT_TYPE)
        })
        .unwrap_or(false);

    Ok(if wants_xlsx {
        ResponseMode::Bytes
    } else {
        default_mode
    })
}

/// Header values must be visible ASCII.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
        .collect()
}

fn link_response(outcome: GenerateOutcome) -> Result<Response<Body>, AppError> {
    let link = outcome
        .link
        .ok_or_else(|| AppError::Internal("link mode produced no link".to_string()))?;

    let body = GenerateReportResponse {
        message: GENERATED_MESSAGE.to_string(),
        artifact_id: outcome.artifact_id,
        customer_name: outcome.customer_name,
        storage_key: outcome.storage_key,
        file_url: link.url,
        expires_at: link.expires_at,
        created_at: outcome.created_at,
        indexed: outcome.indexed,
        warnings: outcome.warnings,
    };

    Ok((StatusCode::OK, Json(body)).into_response())
}

fn bytes_response(outcome: GenerateOutcome) -> Result<Response<Body>, AppError> {
    let document = outcome
        .document
        .ok_or_else(|| AppError::Internal("bytes mode produced no document".to_string()))?;
    let file_name = report_file_name(&outcome.customer_name, outcome.artifact_id);

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, XLSX_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .header(ARTIFACT_ID_HEADER, outcome.artifact_id.to_string());

    if !outcome.warnings.is_empty() {
        let joined = header_safe(&outcome.warnings.join("; "));
        if let Ok(value) = HeaderValue::from_str(&joined) {
            builder = builder.header(WARNINGS_HEADER, value);
        }
    }

    builder
        .body(Body::from(document))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

#[utoipa::path(
    post,
    path = "/api/v0/reports",
    tag = "reports",
    params(
        ("response" = Option<String>, Query, description = "Response mode: link (default) or bytes")
    ),
    request_body(
        content_type = "multipart/form-data",
        description = "customerName, jsonData (cost document), optional imageFile and awsCalculatorUrl. The same fields are accepted as a JSON object."
    ),
    responses(
        (status = 200, description = "Report generated", body = GenerateReportResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 415, description = "Unsupported content type", body = ErrorResponse),
        (status = 502, description = "Artifact storage failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, query, request),
    fields(owner_id = %owner.owner_id, operation = "generate_report")
)]
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    Query(query): Query<GenerateQuery>,
    request: Request,
) -> Result<impl IntoResponse, HttpAppError> {
    let response_mode = select_response_mode(
        &query,
        request.headers(),
        state.reports.options().response_mode,
    )?;

    let outcome = state
        .reports
        .generate_from_request(&owner, request, response_mode)
        .await?;

    let response = match response_mode {
        ResponseMode::Link => link_response(outcome)?,
        ResponseMode::Bytes => bytes_response(outcome)?,
    };

    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/v0/reports",
    tag = "reports",
    responses(
        (status = 200, description = "Reports owned by the caller, newest first", body = ListReportsResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 502, description = "Index or link issuance failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(owner_id = %owner.owner_id, operation = "list_reports"))]
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
) -> Result<Json<ListReportsResponse>, HttpAppError> {
    let response = state.reports.list(&owner).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v0/reports/{artifact_id}/download",
    tag = "reports",
    params(
        ("artifact_id" = Uuid, Path, description = "Report artifact ID")
    ),
    responses(
        (status = 200, description = "Report workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 404, description = "Report not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(owner_id = %owner.owner_id, artifact_id = %artifact_id, operation = "download_report")
)]
pub async fn download_report(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    Path(artifact_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let download = state.reports.download(&owner, artifact_id).await?;
    let file_name = report_file_name(&download.record.customer_name, artifact_id);

    tracing::debug!(
        storage_key = %download.record.storage_key,
        size_bytes = download.bytes.len(),
        "Serving stored report"
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, XLSX_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(download.bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
