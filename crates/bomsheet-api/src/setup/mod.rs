//! Application setup and initialization
//!
//! Everything main needs to go from a loaded [`Config`] to a served router.

pub mod database;
pub mod routes;
pub mod server;

use crate::auth::JwtVerifier;
use crate::services::report::ReportService;
use crate::state::AppState;
use anyhow::{Context, Result};
use bomsheet_core::{Config, IndexBackend};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.log_format(), config.environment());

    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    let pool = match config.index_backend() {
        IndexBackend::Postgres => Some(database::setup_database(&config).await?),
        IndexBackend::Memory => None,
    };

    let storage = bomsheet_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage")?;
    let index = bomsheet_db::create_report_index(&config, pool.clone())
        .context("Failed to initialize report index")?;
    let verifier =
        Arc::new(JwtVerifier::from_config(&config).context("Failed to initialize JWT verifier")?);

    let reports = ReportService::new(
        storage,
        index,
        config.link_ttl(),
        config.pipeline_options(),
    );

    let state = Arc::new(AppState::new(config, reports, verifier, pool));
    let router = routes::build_router(state.clone());

    Ok((state, router))
}
