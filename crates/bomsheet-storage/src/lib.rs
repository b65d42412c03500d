//! Bomsheet Storage Library
//!
//! This crate provides the artifact storage abstraction and its S3 and local
//! filesystem implementations, plus the artifact store adapter and link issuer the
//! report pipeline is built on.
//!
//! # Storage key format
//!
//! Report artifacts are owner-scoped: `{owner_id}/{sanitized_customer_name}_{artifact_id}.xlsx`.
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod artifact;
pub mod factory;
pub mod keys;
pub mod links;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use artifact::{ArtifactStore, StoredArtifact, XLSX_CONTENT_TYPE};
pub use bomsheet_core::StorageBackend;
pub use factory::create_storage;
pub use links::{IssuedLink, LinkIssuer};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
