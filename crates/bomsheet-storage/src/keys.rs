//! Shared key generation for storage backends.
//!
//! Key format: `{owner_id}/{sanitized_customer_name}_{artifact_id}.xlsx`.

use bomsheet_core::validation::sanitize_customer_name;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

/// File extension of every report artifact.
pub const REPORT_EXTENSION: &str = "xlsx";

/// Download filename for an artifact: `{sanitized_customer_name}_{artifact_id}.xlsx`.
pub fn report_file_name(customer_name: &str, artifact_id: Uuid) -> String {
    format!(
        "{}_{}.{}",
        sanitize_customer_name(customer_name),
        artifact_id,
        REPORT_EXTENSION
    )
}

/// Generate the storage key for a report artifact.
///
/// The owner id becomes the first path segment, so it must be a single, non-traversing
/// segment. Email addresses are the usual owner ids and pass unchanged.
pub fn report_storage_key(
    owner_id: &str,
    customer_name: &str,
    artifact_id: Uuid,
) -> StorageResult<String> {
    validate_owner_segment(owner_id)?;
    Ok(format!(
        "{}/{}",
        owner_id,
        report_file_name(customer_name, artifact_id)
    ))
}

fn validate_owner_segment(owner_id: &str) -> StorageResult<()> {
    if owner_id.is_empty() {
        return Err(StorageError::InvalidKey("owner id is empty".to_string()));
    }
    if owner_id == "." || owner_id.contains("..") {
        return Err(StorageError::InvalidKey(
            "owner id contains path traversal".to_string(),
        ));
    }
    if owner_id
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(StorageError::InvalidKey(
            "owner id contains path separators or control characters".to_string(),
        ));
    }
    Ok(())
}

/// Reject keys that could escape a storage root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty()
        || storage_key.contains("..")
        || storage_key.starts_with('/')
        || storage_key.contains('\\')
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Percent-encode each path segment of a key for use in a URL.
pub fn encode_key_for_url(storage_key: &str) -> String {
    storage_key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
