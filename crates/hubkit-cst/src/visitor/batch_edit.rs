// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Applying many span edits to one source text atomically.
//!
//! | Primitive | Effect |
//! |-----------|--------|
//! | `Replace { span, new_text }` | `span.start..span.end` becomes `new_text` |
//! | `InsertAt { position, text }` | `text` is inserted at `position` |
//!
//! All spans refer to the original source. Edits are applied from the end of
//! the text towards its start, so earlier spans stay valid while later text
//! changes length.
//!
//! ```
//! use hubkit_cst::visitor::{BatchSpanEditor, EditPrimitive};
//! use hubkit_cst::Span;
//!
//! let source = "def foo():\n    return 1\n";
//! let mut editor = BatchSpanEditor::new(source);
//! editor.add(EditPrimitive::Replace {
//!     span: Span::new(4, 7),
//!     new_text: "bar".to_string(),
//! });
//! editor.add(EditPrimitive::InsertAt {
//!     position: 8,
//!     text: "x".to_string(),
//! });
//! assert_eq!(editor.apply().unwrap(), "def bar(x):\n    return 1\n");
//! ```

use std::cmp::Ordering;

use hubkit_core::patch::Span;
use hubkit_core::text::{leading_whitespace, line_start};
use thiserror::Error;

/// An atomic edit on source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPrimitive {
    /// Replace the text at `span`.
    Replace { span: Span, new_text: String },
    /// Insert `text` at a byte position.
    InsertAt { position: usize, text: String },
}

impl EditPrimitive {
    /// The span of original text this edit consumes. Zero-width for insertions.
    pub fn span(&self) -> Span {
        match self {
            EditPrimitive::Replace { span, .. } => *span,
            EditPrimitive::InsertAt { position, .. } => Span::empty(*position),
        }
    }

    /// True for `InsertAt`.
    pub fn is_insertion(&self) -> bool {
        matches!(self, EditPrimitive::InsertAt { .. })
    }

    fn replacement(&self) -> &str {
        match self {
            EditPrimitive::Replace { new_text, .. } => new_text,
            EditPrimitive::InsertAt { text, .. } => text,
        }
    }
}

/// Errors raised when a batch of edits cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchEditError {
    #[error("overlapping edits: {first} and {second}")]
    OverlappingEdits { first: Span, second: Span },

    #[error("span {span} is out of bounds for source of length {source_len}")]
    SpanOutOfBounds { span: Span, source_len: usize },

    #[error("span {span} does not fall on character boundaries")]
    NotCharBoundary { span: Span },

    #[error("no edits to apply")]
    EmptyEdits,
}

pub type BatchEditResult<T> = Result<T, BatchEditError>;

/// Options for [`BatchSpanEditor`].
#[derive(Debug, Clone)]
pub struct BatchEditOptions {
    /// Allow an edit to end exactly where another starts. Default: true.
    pub allow_adjacent: bool,
    /// Return the source unchanged instead of failing when there are no
    /// edits. Default: false.
    pub allow_empty: bool,
}

impl Default for BatchEditOptions {
    fn default() -> Self {
        Self {
            allow_adjacent: true,
            allow_empty: false,
        }
    }
}

/// Collects [`EditPrimitive`]s and applies them to a source text in one pass.
pub struct BatchSpanEditor<'src> {
    source: &'src str,
    edits: Vec<EditPrimitive>,
    options: BatchEditOptions,
}

impl<'src> BatchSpanEditor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_options(source, BatchEditOptions::default())
    }

    pub fn with_options(source: &'src str, options: BatchEditOptions) -> Self {
        Self {
            source,
            edits: Vec::new(),
            options,
        }
    }

    pub fn add(&mut self, edit: EditPrimitive) {
        self.edits.push(edit);
    }

    pub fn add_all(&mut self, edits: impl IntoIterator<Item = EditPrimitive>) {
        self.edits.extend(edits);
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply all queued edits and return the new text.
    ///
    /// Insertions at the same position keep the order in which they were
    /// added. An insertion at the start of a replaced span lands before the
    /// replacement text.
    pub fn apply(mut self) -> BatchEditResult<String> {
        if self.edits.is_empty() {
            return if self.options.allow_empty {
                Ok(self.source.to_string())
            } else {
                Err(BatchEditError::EmptyEdits)
            };
        }

        let source_len = self.source.len();
        for edit in &self.edits {
            let span = edit.span();
            if span.end > source_len {
                return Err(BatchEditError::SpanOutOfBounds { span, source_len });
            }
            if !self.source.is_char_boundary(span.start) || !self.source.is_char_boundary(span.end)
            {
                return Err(BatchEditError::NotCharBoundary { span });
            }
        }

        // Descending by start. At the same start the replacement goes first,
        // so the insertion ends up in front of it. The sort is stable, which
        // keeps same-position insertions in the order they were added.
        self.edits.sort_by(|a, b| {
            b.span()
                .start
                .cmp(&a.span().start)
                .then_with(|| match (a.is_insertion(), b.is_insertion()) {
                    (false, true) => Ordering::Less,
                    (true, false) => Ordering::Greater,
                    _ => Ordering::Equal,
                })
        });

        for pair in self.edits.windows(2) {
            let (later, earlier) = (pair[0].span(), pair[1].span());
            let touching = earlier.end == later.start && !earlier.is_empty() && !later.is_empty();
            if later.overlaps(&earlier) || (touching && !self.options.allow_adjacent) {
                return Err(BatchEditError::OverlappingEdits {
                    first: earlier,
                    second: later,
                });
            }
        }

        let mut result = self.source.to_string();
        let mut index = 0;
        while index < self.edits.len() {
            // Gather the run of insertions sharing a position so they can be
            // spliced in their original order.
            let edit = &self.edits[index];
            if edit.is_insertion() {
                let position = edit.span().start;
                let run_end = self.edits[index..]
                    .iter()
                    .position(|e| !e.is_insertion() || e.span().start != position)
                    .map_or(self.edits.len(), |offset| index + offset);
                let text: String = self.edits[index..run_end]
                    .iter()
                    .map(EditPrimitive::replacement)
                    .collect();
                result.insert_str(position, &text);
                index = run_end;
            } else {
                let span = edit.span();
                result.replace_range(span.start..span.end, edit.replacement());
                index += 1;
            }
        }

        Ok(result)
    }
}

/// Indentation of the line containing `position`.
///
/// If that line is blank, the indentation of the previous line is used.
pub fn detect_indentation(source: &str, position: usize) -> &str {
    if position > source.len() {
        return "";
    }
    let start = line_start(source, position);
    let indent = leading_whitespace(&source[start..]);
    let rest = &source[start + indent.len()..];
    let blank = rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n");
    if !blank || start == 0 {
        return indent;
    }
    let prev_start = line_start(source, start - 1);
    leading_whitespace(&source[prev_start..start])
}
