//! Report generation and retrieval.

pub mod decoder;
pub mod pipeline;

pub use decoder::{decode_request, CostDocumentInput, RawReportInput};
pub use pipeline::{GenerateOutcome, ReportDownload, ReportService};
