//! hubkit: keeps the inference client's task methods in sync with the
//! generated task parameter declarations.
//!
//! The `task-params` binary drives [`sync::Synchronizer`]. Parsing and
//! rewriting live in `hubkit-cst`, token resolution in `hubkit-auth`.

pub use hubkit_core::error;

pub mod config;
pub mod format;
pub mod ops;
pub mod sync;
pub mod tasks;

// From impls into HubError
mod error_bridges;

pub use config::SyncConfig;
pub use format::{FormatError, PassThrough, RuffFormatter, SourceFormatter};
pub use sync::{SyncMode, SyncReport, Synchronizer, TaskReport};
