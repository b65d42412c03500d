use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Stages of the generate pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Decoding,
    Validating,
    BuildingTable,
    Rendering,
    Storing,
    Indexing,
    IssuingLink,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Decoding => "decoding",
            PipelineStage::Validating => "validating",
            PipelineStage::BuildingTable => "building_table",
            PipelineStage::Rendering => "rendering",
            PipelineStage::Storing => "storing",
            PipelineStage::Indexing => "indexing",
            PipelineStage::IssuingLink => "issuing_link",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// How a successful generate call hands the artifact back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// JSON body carrying a temporary retrieval link.
    #[default]
    Link,
    /// The spreadsheet bytes as an attachment.
    Bytes,
}

impl FromStr for ResponseMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "link" | "url" => Ok(ResponseMode::Link),
            "bytes" | "file" | "download" => Ok(ResponseMode::Bytes),
            _ => Err(anyhow::anyhow!("Invalid response mode: {}", s)),
        }
    }
}

/// Switches for the single generate pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub embed_image: bool,
    pub include_calculator_row: bool,
    pub response_mode: ResponseMode,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            embed_image: true,
            include_calculator_row: true,
            response_mode: ResponseMode::Link,
        }
    }
}

impl PipelineOptions {
    pub fn with_response_mode(mut self, response_mode: ResponseMode) -> Self {
        self.response_mode = response_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_mode_parsing() {
        assert_eq!("link".parse::<ResponseMode>().unwrap(), ResponseMode::Link);
        assert_eq!(" Bytes ".parse::<ResponseMode>().unwrap(), ResponseMode::Bytes);
        assert_eq!("download".parse::<ResponseMode>().unwrap(), ResponseMode::Bytes);
        assert!("zip".parse::<ResponseMode>().is_err());
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&PipelineStage::IssuingLink).unwrap();
        assert_eq!(json, "\"issuing_link\"");
        assert_eq!(PipelineStage::BuildingTable.to_string(), "building_table");
    }
}
