//! Bomsheet Core Library
//!
//! This crate provides the domain models, error types, configuration and input
//! sanitization shared by every bomsheet component.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ReportServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{PipelineOptions, PipelineStage, ResponseMode};
pub use storage_types::{IndexBackend, StorageBackend};
