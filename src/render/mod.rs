pub mod format;    // currency / percent / volume formatting
pub mod narrative; // table-driven closing sentence
pub mod report;    // per-variant layouts

pub use format::NumberFormat;
pub use report::{render, RenderOptions, ReportKind};
