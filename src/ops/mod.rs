//! Per-task analysis: what is missing and what it needs imported.

pub mod imports;
pub mod missing;

pub use imports::{plan_imports, ImportContext, ImportPlan};
pub use missing::{check_missing_parameters, find_missing_parameters, MissingParameters};
