//! Data models for the application
//!
//! This module contains the data structures used throughout the report pipeline,
//! organized by domain.

mod bom;
mod pipeline;
mod report;

pub use bom::*;
pub use pipeline::*;
pub use report::*;
