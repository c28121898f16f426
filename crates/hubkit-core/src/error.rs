//! Error types and error code constants for hubkit.
//!
//! This module provides a unified error type (`HubError`) that bridges
//! domain-specific errors from the parser, the rewriters and the formatter
//! into a common format suitable for CLI output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file not found, unparseable source)
//! - `4`: Apply errors (rewrite, formatter or write failure)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! Exit code `1` is not an error code: it is reserved for check mode
//! reporting out-of-date signatures.

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for CLI output.
///
/// These codes map to process exit codes and appear in JSON error output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (file not found, parse failure).
    ResolutionError = 3,
    /// Apply errors (failed to rewrite, format or write).
    ApplyError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum HubError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Source file could not be parsed.
    #[error("failed to parse {file}:{line}:{col}: {message}")]
    ParseError {
        file: String,
        line: u32,
        col: u32,
        message: String,
    },

    /// A required external tool is not installed.
    #[error("required tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// The external formatter exited unsuccessfully.
    #[error("`{command}` failed with exit code {exit_code}: {stderr}")]
    FormatterFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// Failed to apply changes.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&HubError> for OutputErrorCode {
    fn from(err: &HubError) -> Self {
        match err {
            HubError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            HubError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            HubError::ParseError { .. } => OutputErrorCode::ResolutionError,
            HubError::ToolNotFound { .. } => OutputErrorCode::ApplyError,
            HubError::FormatterFailed { .. } => OutputErrorCode::ApplyError,
            HubError::ApplyError { .. } => OutputErrorCode::ApplyError,
            HubError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<HubError> for OutputErrorCode {
    fn from(err: HubError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl HubError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        HubError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        HubError::FileNotFound { path: path.into() }
    }

    /// Create an apply error tied to a file.
    pub fn apply(message: impl Into<String>, file: impl Into<String>) -> Self {
        HubError::ApplyError {
            message: message.into(),
            file: Some(file.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        HubError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn invalid_arguments_maps_to_2() {
            let err = HubError::invalid_args("bad flag");
            assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn file_not_found_maps_to_resolution_error() {
            let err = HubError::file_not_found("src/_client.py");
            assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn parse_error_maps_to_resolution_error() {
            let err = HubError::ParseError {
                file: "types/x.py".to_string(),
                line: 3,
                col: 1,
                message: "unexpected indent".to_string(),
            };
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn formatter_errors_map_to_apply_error() {
            let missing = HubError::ToolNotFound {
                tool: "ruff".to_string(),
            };
            let failed = HubError::FormatterFailed {
                command: "ruff format".to_string(),
                exit_code: 2,
                stderr: "boom".to_string(),
            };
            assert_eq!(missing.error_code().code(), 4);
            assert_eq!(failed.error_code().code(), 4);
        }

        #[test]
        fn internal_maps_to_10() {
            let err = HubError::internal("unexpected");
            assert_eq!(OutputErrorCode::from(err).code(), 10);
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn parse_error_includes_position() {
            let err = HubError::ParseError {
                file: "a.py".to_string(),
                line: 2,
                col: 5,
                message: "invalid syntax".to_string(),
            };
            assert_eq!(err.to_string(), "failed to parse a.py:2:5: invalid syntax");
        }

        #[test]
        fn formatter_failed_includes_stderr() {
            let err = HubError::FormatterFailed {
                command: "ruff check".to_string(),
                exit_code: 1,
                stderr: "E999".to_string(),
            };
            assert!(err.to_string().contains("ruff check"));
            assert!(err.to_string().contains("E999"));
        }
    }
}
