//! Bomsheet Report Library
//!
//! Turns a parsed cost document into a [`CostTable`] and renders it as an xlsx workbook.
//! Both steps are pure: no I/O beyond the in-memory workbook buffer.

pub mod cost_table;
pub mod currency;
pub mod renderer;

pub use cost_table::{CostRow, CostTable, CostTableError};
pub use currency::format_usd;
pub use renderer::{render_report, RenderError, RenderOptions, RenderedReport};
