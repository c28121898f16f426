//! Conversions from tool-level errors into `HubError`.
//!
//! Parser and editor errors carry no file name, so they are converted
//! through helpers that take the path instead of `From` impls.

use std::io;
use std::path::Path;

use hubkit_core::error::HubError;
use hubkit_cst::visitor::BatchEditError;
use hubkit_cst::ParserError;

use crate::format::FormatError;

impl From<FormatError> for HubError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::ToolNotFound { tool } => HubError::ToolNotFound { tool },
            FormatError::Failed {
                command,
                exit_code,
                stderr,
            } => HubError::FormatterFailed {
                command,
                exit_code,
                stderr,
            },
            FormatError::Io(e) => HubError::ApplyError {
                message: format!("formatter I/O error: {e}"),
                file: None,
            },
        }
    }
}

pub(crate) fn parse_error(path: &Path, err: &ParserError) -> HubError {
    let message = match err {
        ParserError::TokenizerError { error, .. } => error.to_string(),
        ParserError::InvalidSyntax { message, .. } => message.clone(),
    };
    HubError::ParseError {
        file: path.display().to_string(),
        line: err.line(),
        col: err.col(),
        message,
    }
}

/// Edits are generated from the tree they apply to, so a rejected batch
/// is a bug.
pub(crate) fn edit_error(path: &Path, err: BatchEditError) -> HubError {
    HubError::internal(format!("rewriting {} failed: {err}", path.display()))
}

pub(crate) fn read_error(path: &Path, err: io::Error) -> HubError {
    if err.kind() == io::ErrorKind::NotFound {
        HubError::file_not_found(path.display().to_string())
    } else {
        HubError::invalid_args(format!("cannot read {}: {err}", path.display()))
    }
}

pub(crate) fn write_error(path: &Path, err: io::Error) -> HubError {
    HubError::apply(format!("write failed: {err}"), path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubkit_core::error::OutputErrorCode;

    #[test]
    fn test_formatter_errors_are_apply_errors() {
        let missing: HubError = FormatError::ToolNotFound {
            tool: "ruff".to_string(),
        }
        .into();
        assert!(matches!(missing, HubError::ToolNotFound { ref tool } if tool == "ruff"));
        assert_eq!(missing.error_code(), OutputErrorCode::ApplyError);

        let io: HubError = FormatError::Io(io::Error::other("disk full")).into();
        assert_eq!(io.error_code(), OutputErrorCode::ApplyError);
    }

    #[test]
    fn test_parse_error_keeps_position() {
        let err = hubkit_cst::parse_module("def f(:\n    pass\n").unwrap_err();
        let hub = parse_error(Path::new("types/x.py"), &err);
        match hub {
            HubError::ParseError { file, line, .. } => {
                assert_eq!(file, "types/x.py");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_resolution_error() {
        let err = read_error(
            Path::new("client.py"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
    }
}
