//! Application state shared by every handler.

use std::sync::Arc;

use bomsheet_core::Config;
use sqlx::PgPool;

use crate::auth::JwtVerifier;
use crate::services::report::ReportService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub reports: ReportService,
    pub verifier: Arc<JwtVerifier>,
    /// Present only when the Postgres index backend is configured.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        config: Config,
        reports: ReportService,
        verifier: Arc<JwtVerifier>,
        db_pool: Option<PgPool>,
    ) -> Self {
        Self {
            config,
            reports,
            verifier,
            db_pool,
        }
    }
}
