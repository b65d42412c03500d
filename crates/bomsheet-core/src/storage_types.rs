use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Selects where rendered report artifacts are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// Metadata index backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    Postgres,
    /// Process-local index; records are lost on restart. Development and tests only.
    Memory,
}

impl FromStr for IndexBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(IndexBackend::Postgres),
            "memory" => Ok(IndexBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid index backend: {}", s)),
        }
    }
}

impl Display for IndexBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            IndexBackend::Postgres => write!(f, "postgres"),
            IndexBackend::Memory => write!(f, "memory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing_is_case_insensitive() {
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!("local".parse::<StorageBackend>().unwrap(), StorageBackend::Local);
        assert_eq!(
            "PostgreSQL".parse::<IndexBackend>().unwrap(),
            IndexBackend::Postgres
        );
        assert!("nfs".parse::<StorageBackend>().is_err());
        assert!("dynamo".parse::<IndexBackend>().is_err());
    }

    #[test]
    fn test_backend_display_round_trips() {
        assert_eq!(StorageBackend::Local.to_string(), "local");
        assert_eq!(IndexBackend::Memory.to_string(), "memory");
    }
}
