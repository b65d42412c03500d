//! Configuration module
//!
//! This module provides configuration structures for the report service, including
//! storage, metadata index, authentication and pipeline settings. Everything is read
//! once at startup and injected; nothing downstream reads the environment.

use std::env;
use std::str::FromStr;

use crate::models::{PipelineOptions, ResponseMode};
use crate::storage_types::{IndexBackend, StorageBackend};

// Common constants
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const LINK_TTL_SECONDS: u64 = 3600;
const MAX_REQUEST_BODY_MB: usize = 20;
const DEFAULT_REPORT_TABLE: &str = "report_metadata";
const DEFAULT_OWNER_CLAIM: &str = "email";
const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Settings shared by every HTTP-facing service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub max_request_body_bytes: usize,
    /// "compact" (default) or "json"
    pub log_format: String,
}

/// Report service configuration
#[derive(Clone, Debug)]
pub struct ReportServiceConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Metadata index configuration
    pub index_backend: IndexBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub report_table: String,
    // Authentication
    pub jwt_secret: Option<String>,
    pub jwt_jwks_url: Option<String>,
    pub jwt_issuer: Option<String>,
    pub jwt_owner_claim: String,
    // Pipeline
    pub link_ttl_seconds: u64,
    pub embed_image: bool,
    pub include_calculator_row: bool,
    pub default_response_mode: ResponseMode,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ReportServiceConfig>);

impl Config {
    fn as_report(&self) -> &ReportServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.as_report().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ReportServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_report().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_report().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_report().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_report().base.environment
    }

    pub fn max_request_body_bytes(&self) -> usize {
        self.as_report().base.max_request_body_bytes
    }

    pub fn log_format(&self) -> &str {
        &self.as_report().base.log_format
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_report().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_report().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_report().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_report().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_report().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_report().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_report().local_storage_base_url.as_deref()
    }

    pub fn index_backend(&self) -> IndexBackend {
        self.as_report().index_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_report().database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_report().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_report().db_timeout_seconds
    }

    pub fn report_table(&self) -> &str {
        &self.as_report().report_table
    }

    pub fn jwt_secret(&self) -> Option<&str> {
        self.as_report().jwt_secret.as_deref()
    }

    pub fn jwt_jwks_url(&self) -> Option<&str> {
        self.as_report().jwt_jwks_url.as_deref()
    }

    pub fn jwt_issuer(&self) -> Option<&str> {
        self.as_report().jwt_issuer.as_deref()
    }

    pub fn jwt_owner_claim(&self) -> &str {
        &self.as_report().jwt_owner_claim
    }

    pub fn link_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.as_report().link_ttl_seconds)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        let report = self.as_report();
        PipelineOptions {
            embed_image: report.embed_image,
            include_calculator_row: report.include_calculator_row,
            response_mode: report.default_response_mode,
        }
    }
}

fn is_production_name(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool_or(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl ReportServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_mb = env_parse_or("MAX_REQUEST_BODY_MB", MAX_REQUEST_BODY_MB);

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            max_request_body_bytes: max_request_body_mb * 1024 * 1024,
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        };

        let storage_backend = env_opt("STORAGE_BACKEND")
            .map(|s| s.parse::<StorageBackend>())
            .transpose()?;

        let index_backend = env_opt("INDEX_BACKEND")
            .map(|s| s.parse::<IndexBackend>())
            .transpose()?
            .unwrap_or(IndexBackend::Postgres);

        let default_response_mode = env_opt("DEFAULT_RESPONSE_MODE")
            .map(|s| s.parse::<ResponseMode>())
            .transpose()?
            .unwrap_or_default();

        let config = ReportServiceConfig {
            base,
            storage_backend,
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION"),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            aws_region: env_opt("AWS_REGION"),
            local_storage_path: env_opt("LOCAL_STORAGE_PATH"),
            local_storage_base_url: env_opt("LOCAL_STORAGE_BASE_URL"),
            index_backend,
            database_url: env_opt("DATABASE_URL"),
            db_max_connections: env_parse_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_parse_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            report_table: env_opt("REPORT_TABLE")
                .unwrap_or_else(|| DEFAULT_REPORT_TABLE.to_string()),
            jwt_secret: env_opt("JWT_SECRET"),
            jwt_jwks_url: env_opt("JWT_JWKS_URL"),
            jwt_issuer: env_opt("JWT_ISSUER"),
            jwt_owner_claim: env_opt("JWT_OWNER_CLAIM")
                .unwrap_or_else(|| DEFAULT_OWNER_CLAIM.to_string()),
            link_ttl_seconds: env_parse_or("LINK_TTL_SECONDS", LINK_TTL_SECONDS),
            embed_image: env_bool_or("EMBED_IMAGE", true),
            include_calculator_row: env_bool_or("INCLUDE_CALCULATOR_ROW", true),
            default_response_mode,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match (&self.jwt_secret, &self.jwt_jwks_url) {
            (None, None) => {
                return Err(anyhow::anyhow!(
                    "Either JWT_SECRET or JWT_JWKS_URL must be set for authentication"
                ))
            }
            (Some(secret), _) if secret.len() < MIN_JWT_SECRET_LENGTH => {
                return Err(anyhow::anyhow!(
                    "JWT_SECRET must be at least {} characters long",
                    MIN_JWT_SECRET_LENGTH
                ))
            }
            _ => {}
        }

        if self.jwt_owner_claim.trim().is_empty() {
            return Err(anyhow::anyhow!("JWT_OWNER_CLAIM must not be empty"));
        }

        if self.link_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("LINK_TTL_SECONDS must be greater than zero"));
        }

        if !self
            .report_table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(anyhow::anyhow!(
                "REPORT_TABLE may only contain ASCII letters, digits and underscores"
            ));
        }

        if self.index_backend == IndexBackend::Postgres {
            match self.database_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                _ => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string when INDEX_BACKEND=postgres"
                    ))
                }
            }
        }

        // Validate storage backend configuration
        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> ReportServiceConfig {
        ReportServiceConfig {
            base: BaseConfig {
                server_port: 4000,
                cors_origins: vec!["*".to_string()],
                environment: "test".to_string(),
                max_request_body_bytes: 1024 * 1024,
                log_format: "compact".to_string(),
            },
            storage_backend: Some(StorageBackend::Local),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: Some("/tmp/bomsheet".to_string()),
            local_storage_base_url: Some("http://localhost:4000/files".to_string()),
            index_backend: IndexBackend::Memory,
            database_url: None,
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            report_table: DEFAULT_REPORT_TABLE.to_string(),
            jwt_secret: Some("x".repeat(MIN_JWT_SECRET_LENGTH)),
            jwt_jwks_url: None,
            jwt_issuer: None,
            jwt_owner_claim: DEFAULT_OWNER_CLAIM.to_string(),
            link_ttl_seconds: LINK_TTL_SECONDS,
            embed_image: true,
            include_calculator_row: true,
            default_response_mode: ResponseMode::Link,
        }
    }

    #[test]
    fn test_local_memory_config_is_valid() {
        assert!(local_config().validate().is_ok());
    }

    #[test]
    fn test_missing_auth_is_rejected() {
        let mut config = local_config();
        config.jwt_secret = None;
        assert!(config.validate().is_err());

        config.jwt_jwks_url = Some("https://issuer.example.com/.well-known/jwks.json".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_is_rejected() {
        let mut config = local_config();
        config.jwt_secret = Some("short".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgres_index_requires_database_url() {
        let mut config = local_config();
        config.index_backend = IndexBackend::Postgres;
        assert!(config.validate().is_err());

        config.database_url = Some("postgresql://localhost/bomsheet".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_s3_backend_requires_bucket_and_region() {
        let mut config = local_config();
        config.storage_backend = Some(StorageBackend::S3);
        assert!(config.validate().is_err());

        config.s3_bucket = Some("generated-bom-files".to_string());
        assert!(config.validate().is_err());

        config.aws_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_report_table_must_be_identifier() {
        let mut config = local_config();
        config.report_table = "report; DROP TABLE x".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pipeline_options_follow_config() {
        let mut report = local_config();
        report.embed_image = false;
        report.default_response_mode = ResponseMode::Bytes;
        let config = Config(Box::new(report));

        let options = config.pipeline_options();
        assert!(!options.embed_image);
        assert!(options.include_calculator_row);
        assert_eq!(options.response_mode, ResponseMode::Bytes);
        assert_eq!(config.link_ttl().as_secs(), 3600);
    }
}
