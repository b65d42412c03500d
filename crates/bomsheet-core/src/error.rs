//! Error types module
//!
//! This module provides the core error types used throughout bomsheet. All errors are
//! unified under the `AppError` enum, which the API layer renders as a structured
//! response with a machine-readable code.

use std::io;

use crate::models::{BomError, PipelineStage};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request could succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Validation error: {message}")]
    Validation {
        /// Names of the missing or invalid fields
        fields: Vec<String>,
        message: String,
    },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// Terminal failure of a generate pipeline stage.
    #[error("{stage} failed: {source}")]
    StageFailed {
        stage: PipelineStage,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Validation failure naming the offending fields.
    pub fn validation(fields: Vec<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            fields,
            message: message.into(),
        }
    }

    /// Validation failure for missing required fields.
    pub fn missing_fields(fields: &[&str]) -> Self {
        AppError::Validation {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            message: format!("Missing required field(s): {}", fields.join(", ")),
        }
    }

    /// Tag this error with the pipeline stage it terminated. Already-tagged errors keep
    /// their original stage.
    pub fn at_stage(self, stage: PipelineStage) -> Self {
        match self {
            AppError::StageFailed { .. } => self,
            other => AppError::StageFailed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage that failed, if this error came out of the pipeline.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            AppError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The underlying error with any stage tag removed.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::StageFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Offending field names for validation failures.
    pub fn fields(&self) -> &[String] {
        match self.root() {
            AppError::Validation { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Variant name for logs and non-production responses.
    pub fn error_type(&self) -> &'static str {
        match self.root() {
            AppError::Unauthenticated(_) => "Unauthenticated",
            AppError::Validation { .. } => "Validation",
            AppError::UnsupportedMediaType(_) => "UnsupportedMediaType",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::NotFound(_) => "NotFound",
            AppError::Storage(_) => "Storage",
            AppError::Index(_) => "Index",
            AppError::Render(_) => "Render",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
            AppError::StageFailed { .. } => "StageFailed",
        }
    }

    /// Full message including any source chain.
    pub fn detailed_message(&self) -> String {
        match self.root() {
            AppError::InternalWithSource { message, source } => {
                format!("{}: {:#}", message, source)
            }
            other => other.to_string(),
        }
    }
}

// Error conversion implementations
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<BomError> for AppError {
    fn from(err: BomError) -> Self {
        AppError::Validation {
            fields: err.fields(),
            message: err.to_string(),
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err.root() {
        AppError::Unauthenticated(_) => (
            401,
            "UNAUTHENTICATED",
            false,
            Some("Sign in again and retry with a valid bearer token"),
            false,
            LogLevel::Debug,
        ),
        AppError::Validation { .. } => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Check the listed fields and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedMediaType(_) => (
            415,
            "UNSUPPORTED_MEDIA_TYPE",
            false,
            Some("Send application/json or multipart/form-data"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce the image or cost document size"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the report ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Storage(_) => (
            502,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Index(_) => (
            500,
            "INDEX_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Render(_) => (
            500,
            "RENDER_ERROR",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        // root() never returns a StageFailed
        AppError::StageFailed { .. } => (
            500,
            "INTERNAL_ERROR",
            false,
            None,
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self.root() {
            AppError::Unauthenticated(_) => "User not authenticated".to_string(),
            AppError::Validation { message, .. } => message.clone(),
            AppError::UnsupportedMediaType(msg) => format!("Unsupported media type: {}", msg),
            AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::NotFound(msg) => format!("Not found: {}", msg),
            AppError::Storage(_) => "Failed to store the generated report".to_string(),
            AppError::Index(_) => "Failed to record report metadata".to_string(),
            AppError::Render(_) => "Failed to render the report".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
            AppError::StageFailed { .. } => "An internal error occurred".to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tag_keeps_root_metadata() {
        let err = AppError::Storage("bucket unreachable".to_string()).at_stage(PipelineStage::Storing);
        assert_eq!(err.stage(), Some(PipelineStage::Storing));
        assert_eq!(err.http_status_code(), 502);
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert_eq!(err.error_type(), "Storage");
        assert!(err.is_sensitive());
    }

    #[test]
    fn test_stage_tag_is_not_overwritten() {
        let err = AppError::missing_fields(&["customerName"])
            .at_stage(PipelineStage::Decoding)
            .at_stage(PipelineStage::Validating);
        assert_eq!(err.stage(), Some(PipelineStage::Decoding));
        assert_eq!(err.fields(), &["customerName".to_string()]);
    }

    #[test]
    fn test_missing_fields_message_names_each_field() {
        let err = AppError::missing_fields(&["customerName", "jsonData"]);
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(
            err.client_message(),
            "Missing required field(s): customerName, jsonData"
        );
    }

    #[test]
    fn test_unauthenticated_maps_to_401() {
        let err = AppError::Unauthenticated("no token".to_string());
        assert_eq!(err.http_status_code(), 401);
        assert_eq!(err.client_message(), "User not authenticated");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_bom_error_becomes_validation() {
        let bom_err = crate::models::BomDocument::from_value(&serde_json::json!({
            "Groups": {"Services": [{"Region": "us-east-1"}]}
        }))
        .unwrap_err();
        let err: AppError = bom_err.into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(
            err.fields(),
            &["Groups.Services[0].Service Name".to_string()]
        );
    }

    #[test]
    fn test_unsupported_media_type_status() {
        let err = AppError::UnsupportedMediaType("text/plain".to_string());
        assert_eq!(err.http_status_code(), 415);
    }
}
