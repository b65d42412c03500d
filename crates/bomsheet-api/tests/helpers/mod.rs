//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p bomsheet-api`. The app runs against a tempdir
//! `LocalStorage` and the in-memory report index, so no external services are needed.

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use bomsheet_api::constants;
use bomsheet_api::setup::routes;
use bomsheet_api::state::AppState;
use bomsheet_api::ReportService;
use bomsheet_api::auth::JwtVerifier;
use bomsheet_core::{
    BaseConfig, Config, IndexBackend, PipelineOptions, ReportServiceConfig, ResponseMode,
    StorageBackend,
};
use bomsheet_db::{MemoryReportIndex, ReportIndex};
use bomsheet_storage::LocalStorage;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_BASE_URL: &str = "http://localhost:4000/files";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus the resources it was built on.
pub struct TestApp {
    pub server: TestServer,
    pub index: Arc<MemoryReportIndex>,
    pub storage_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Path of a stored artifact on disk.
    pub fn artifact_path(&self, storage_key: &str) -> std::path::PathBuf {
        self.storage_dir.path().join(storage_key)
    }

    /// Number of files written under the storage root.
    pub fn stored_file_count(&self) -> usize {
        count_files(self.storage_dir.path())
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        count_files(&path)
                    } else {
                        1
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}

fn create_test_config(storage_dir: &Path, max_request_body_bytes: usize) -> Config {
    Config(Box::new(ReportServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            max_request_body_bytes,
            log_format: "compact".to_string(),
        },
        storage_backend: Some(StorageBackend::Local),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(storage_dir.display().to_string()),
        local_storage_base_url: Some(TEST_BASE_URL.to_string()),
        index_backend: IndexBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        db_timeout_seconds: 5,
        report_table: "report_metadata".to_string(),
        jwt_secret: Some(auth::TEST_JWT_SECRET.to_string()),
        jwt_jwks_url: None,
        jwt_issuer: Some(auth::TEST_ISSUER.to_string()),
        jwt_owner_claim: "email".to_string(),
        link_ttl_seconds: 3600,
        embed_image: true,
        include_calculator_row: true,
        default_response_mode: ResponseMode::Link,
    }))
}

/// Setup test app with isolated local storage and an empty index.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_body_limit(20 * 1024 * 1024).await
}

pub async fn setup_test_app_with_body_limit(max_request_body_bytes: usize) -> TestApp {
    let storage_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(storage_dir.path(), max_request_body_bytes);

    let storage = LocalStorage::new(storage_dir.path(), TEST_BASE_URL.to_string())
        .await
        .expect("Failed to create local storage");
    let index = Arc::new(MemoryReportIndex::new());
    let index_dyn: Arc<dyn ReportIndex> = index.clone();

    let reports = ReportService::new(
        Arc::new(storage),
        index_dyn,
        config.link_ttl(),
        PipelineOptions::default(),
    );
    let verifier = Arc::new(
        JwtVerifier::from_config(&config).expect("Failed to create JWT verifier"),
    );

    let state = Arc::new(AppState::new(config, reports, verifier, None));
    let app = routes::build_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        index,
        storage_dir,
    }
}
