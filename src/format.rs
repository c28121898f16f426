//! External source formatting.
//!
//! Rewritten client source is normalized by `ruff` before it is written
//! back. The formatter is a trait so the sync can run without `ruff`
//! installed.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Errors from running a formatter.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("{tool} executable not found")]
    ToolNotFound { tool: String },

    #[error("`{command}` failed with exit code {exit_code}: {stderr}")]
    Failed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("formatter I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Normalizes Python source text.
pub trait SourceFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError>;
}

/// Returns the source unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl SourceFormatter for PassThrough {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }
}

/// Runs `ruff check --fix` then `ruff format` on a scratch copy.
#[derive(Debug, Default, Clone)]
pub struct RuffFormatter {
    binary: Option<PathBuf>,
}

impl RuffFormatter {
    /// Formatter using the `ruff` found on `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter using a specific `ruff` executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }

    fn resolve(&self) -> Result<PathBuf, FormatError> {
        if let Some(binary) = &self.binary {
            return Ok(binary.clone());
        }
        which::which("ruff").map_err(|_| FormatError::ToolNotFound {
            tool: "ruff".to_string(),
        })
    }
}

impl SourceFormatter for RuffFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        let ruff = self.resolve()?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tmp.py");
        std::fs::write(&path, source)?;

        run_ruff(&ruff, &["check", "--fix", "--quiet"], &path)?;
        run_ruff(&ruff, &["format", "--quiet"], &path)?;

        Ok(std::fs::read_to_string(&path)?)
    }
}

fn run_ruff(ruff: &Path, args: &[&str], file: &Path) -> Result<(), FormatError> {
    debug!(ruff = %ruff.display(), ?args, "running formatter");
    let output = Command::new(ruff).args(args).arg(file).output()?;
    if output.status.success() {
        return Ok(());
    }
    Err(FormatError::Failed {
        command: format!("ruff {}", args.join(" ")),
        exit_code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
