//! Byte spans into source text.
//!
//! Every syntax node records the span it was parsed from, and every edit the
//! rewriters produce is expressed against those spans.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte offsets into file content.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// A reversed pair is normalized so that `start <= end` always holds.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Span { start, end }
        } else {
            Span {
                start: end,
                end: start,
            }
        }
    }

    /// A zero-width span at `position`.
    pub fn empty(position: usize) -> Self {
        Span {
            start: position,
            end: position,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slice `source` by this span.
    ///
    /// Returns an empty string when the span does not fall on valid
    /// boundaries of `source`.
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len_and_empty() {
        let span = Span::new(3, 7);
        assert_eq!(span.len(), 4);
        assert!(!span.is_empty());
        assert!(Span::empty(5).is_empty());
    }

    #[test]
    fn test_span_reversed_is_normalized() {
        let span = Span::new(9, 2);
        assert_eq!(span, Span::new(2, 9));
    }

    #[test]
    fn test_span_overlap_excludes_adjacent() {
        let a = Span::new(0, 5);
        assert!(a.overlaps(&Span::new(4, 8)));
        assert!(!a.overlaps(&Span::new(5, 8)));
    }

    #[test]
    fn test_span_slice() {
        let source = "def foo(): pass";
        assert_eq!(Span::new(4, 7).slice(source), "foo");
        assert_eq!(Span::new(4, 70).slice(source), "");
    }
}
