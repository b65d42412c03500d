//! Report metadata index
//!
//! The index maps an owner to the reports stored on their behalf. Every query is scoped to
//! a single owner id; there is no path that reads another owner's records.

pub mod report_index;

pub use report_index::{
    create_report_index, IndexError, MemoryReportIndex, PgReportIndex, ReportIndex,
    ReportIndexEntry,
};
