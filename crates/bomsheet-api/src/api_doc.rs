//! OpenAPI documentation.
//! API version is in `crate::constants::API_VERSION`.
//! Paths in handler annotations use placeholder /api/v0; they are transformed at runtime to the actual version.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::constants::{API_BASE, API_VERSION};
use crate::error;
use crate::handlers;
use bomsheet_core::models;

/// Placeholder version used in handler path annotations (utoipa requires compile-time literals).
const OPENAPI_PATH_PLACEHOLDER: &str = "/api/v0";

fn transform_openapi_paths(spec: &mut utoipa::openapi::OpenApi, version: &str) {
    let replacement = format!("{}/{}", API_BASE, version);
    if OPENAPI_PATH_PLACEHOLDER == replacement {
        return;
    }
    let path_map = std::mem::take(&mut spec.paths.paths);
    for (key, item) in path_map {
        let new_key = key.replacen(OPENAPI_PATH_PLACEHOLDER, &replacement, 1);
        spec.paths.paths.insert(new_key, item);
    }
}

/// Returns the OpenAPI spec with path placeholders replaced by the current API version.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    transform_openapi_paths(&mut spec, API_VERSION);
    spec
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bomsheet API",
        version = "0.1.0",
        description = "Turns pricing-calculator cost exports into formatted xlsx cost reports. Reports are stored per owner and listed with short-lived download links. All report endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::reports::generate_report,
        handlers::reports::list_reports,
        handlers::reports::download_report,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::GenerateReportResponse,
            models::ListReportsResponse,
            models::ReportFileEntry,
            models::PipelineStage,
            models::ResponseMode,
            handlers::health::HealthCheckResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "reports", description = "Generate, list and download cost reports"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_report_paths() {
        let spec = get_openapi_spec();
        assert!(spec.paths.paths.contains_key("/api/v0/reports"));
        assert!(spec
            .paths
            .paths
            .contains_key("/api/v0/reports/{artifact_id}/download"));
        assert!(spec.paths.paths.contains_key("/health"));
    }
}
