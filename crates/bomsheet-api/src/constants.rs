//! API constants

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

pub const API_VERSION: &str = "v0";

/// Versioned prefix every report route lives under.
pub const API_PREFIX: &str = "/api/v0";

pub const XLSX_CONTENT_TYPE: &str = bomsheet_storage::XLSX_CONTENT_TYPE;

/// Response header carrying the artifact id in bytes mode.
pub const ARTIFACT_ID_HEADER: &str = "x-report-artifact-id";

/// Response header carrying render/index warnings in bytes mode.
pub const WARNINGS_HEADER: &str = "x-report-warnings";
