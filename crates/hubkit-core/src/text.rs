//! Text position utilities for byte offset and line:column conversions.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count Unicode scalar values, not bytes

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds content length, returns the position at end of content.
pub fn byte_offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, ch) in content.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Byte offset of the start of the line containing `offset`.
pub fn line_start(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Leading whitespace of `line`.
pub fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_first_line() {
        assert_eq!(byte_offset_to_position("abc", 0), (1, 1));
        assert_eq!(byte_offset_to_position("abc", 2), (1, 3));
    }

    #[test]
    fn test_position_after_newline() {
        let content = "ab\ncd\nef";
        assert_eq!(byte_offset_to_position(content, 3), (2, 1));
        assert_eq!(byte_offset_to_position(content, 7), (3, 2));
    }

    #[test]
    fn test_position_multibyte_counts_chars() {
        let content = "é = 1";
        // 'é' is two bytes; the space after it is the second column.
        assert_eq!(byte_offset_to_position(content, 2), (1, 2));
    }

    #[test]
    fn test_position_past_end() {
        assert_eq!(byte_offset_to_position("ab\n", 100), (2, 1));
    }

    #[test]
    fn test_line_start() {
        let content = "one\n  two\nthree";
        assert_eq!(line_start(content, 6), 4);
        assert_eq!(line_start(content, 3), 0);
        assert_eq!(line_start(content, 100), 10);
    }

    #[test]
    fn test_leading_whitespace() {
        assert_eq!(leading_whitespace("    x = 1"), "    ");
        assert_eq!(leading_whitespace("\tx"), "\t");
        assert_eq!(leading_whitespace("x"), "");
        assert_eq!(leading_whitespace("   "), "   ");
    }
}
