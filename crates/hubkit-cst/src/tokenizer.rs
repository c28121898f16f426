// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tokenizer for Python source text.
//!
//! Produces a flat token stream with explicit `Newline`, `Indent` and `Dedent`
//! tokens, following the same logical-line rules as CPython:
//!
//! - Newlines inside `()`, `[]` and `{}` are implicit line joins
//! - A backslash immediately before a newline joins the physical lines
//! - Blank lines and comment-only lines produce no tokens at all
//! - Comments are skipped; they are recovered from the source text when needed
//!
//! Every token borrows its text from the source and carries its byte span, so
//! the parser never copies source text.

use hubkit_core::patch::Span;
use thiserror::Error;

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokType {
    /// Identifier or keyword.
    Name,
    /// Numeric literal.
    Number,
    /// String literal, including any prefix (`r`, `b`, `f`, ...).
    String,
    /// Operator or delimiter.
    Op,
    /// End of a logical line.
    Newline,
    /// Increase in indentation (zero width).
    Indent,
    /// Decrease in indentation (zero width).
    Dedent,
    /// End of input.
    EndMarker,
}

/// A single token borrowed from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokType,
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    /// True if this is the operator `op`.
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokType::Op && self.text == op
    }

    /// True if this is the name (or keyword) `name`.
    pub fn is_name(&self, name: &str) -> bool {
        self.kind == TokType::Name && self.text == name
    }
}

/// Errors raised while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokError {
    #[error("unterminated string literal")]
    UnterminatedString { offset: usize },

    #[error("unterminated triple-quoted string literal")]
    UnterminatedTripleQuotedString { offset: usize },

    #[error("unexpected character {ch:?}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("unmatched closing bracket")]
    UnmatchedClosingBracket { offset: usize },

    #[error("unexpected end of file inside brackets")]
    UnclosedBracket { offset: usize },

    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent { offset: usize },

    #[error("unexpected character after line continuation character")]
    BadLineContinuation { offset: usize },
}

impl TokError {
    /// Byte offset where the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            TokError::UnterminatedString { offset }
            | TokError::UnterminatedTripleQuotedString { offset }
            | TokError::UnexpectedCharacter { offset, .. }
            | TokError::UnmatchedClosingBracket { offset }
            | TokError::UnclosedBracket { offset }
            | TokError::InconsistentDedent { offset }
            | TokError::BadLineContinuation { offset } => *offset,
        }
    }
}

const OPERATORS_3: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];

const OPERATORS_2: &[&str] = &[
    "->", "**", "//", "<<", ">>", "<=", ">=", "==", "!=", ":=", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "@=",
];

const OPERATORS_1: &str = "+-*/%@&|^~<>()[]{},:;.=!";

const TAB_SIZE: usize = 8;

/// Tokenize `source` into a complete token stream ending in `EndMarker`.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, TokError> {
    let mut state = TokState::new(source);
    state.run()?;
    Ok(state.tokens)
}

/// True if `prefix` is a valid string literal prefix (case-insensitive).
pub fn is_string_prefix(prefix: &str) -> bool {
    matches!(
        prefix.to_ascii_lowercase().as_str(),
        "" | "r" | "u" | "b" | "br" | "rb" | "f" | "fr" | "rf" | "t" | "tr" | "rt"
    )
}

fn is_id_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_id_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Length of the line terminator at `pos`, if there is one.
fn newline_len(source: &str, pos: usize) -> Option<usize> {
    let rest = source.get(pos..)?;
    if rest.starts_with("\r\n") {
        Some(2)
    } else if rest.starts_with('\n') || rest.starts_with('\r') {
        Some(1)
    } else {
        None
    }
}

struct TokState<'a> {
    source: &'a str,
    pos: usize,
    indent_stack: Vec<usize>,
    /// Open brackets with the offset where each was opened.
    paren_stack: Vec<usize>,
    at_line_start: bool,
    tokens: Vec<Token<'a>>,
}

impl<'a> TokState<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            indent_stack: vec![0],
            paren_stack: Vec::new(),
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn push(&mut self, kind: TokType, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            text: &self.source[start..end],
            span: Span::new(start, end),
        });
    }

    fn run(&mut self) -> Result<(), TokError> {
        if self.source.starts_with('\u{feff}') {
            self.pos = '\u{feff}'.len_utf8();
        }

        loop {
            if self.at_line_start && self.paren_stack.is_empty() {
                self.at_line_start = false;
                if !self.handle_line_start()? {
                    break;
                }
            }

            let Some(c) = self.peek_char() else {
                break;
            };

            match c {
                ' ' | '\t' | '\x0c' => self.pos += 1,
                '#' => self.skip_comment(),
                '\\' => {
                    let after = self.pos + 1;
                    match newline_len(self.source, after) {
                        Some(len) => self.pos = after + len,
                        None => return Err(TokError::BadLineContinuation { offset: self.pos }),
                    }
                }
                '\n' | '\r' => {
                    let start = self.pos;
                    self.pos += newline_len(self.source, start).unwrap_or(1);
                    if self.paren_stack.is_empty() {
                        self.push(TokType::Newline, start, self.pos);
                        self.at_line_start = true;
                    }
                }
                '"' | '\'' => {
                    let start = self.pos;
                    let end = scan_string_end(self.source, start, "", start)?;
                    self.pos = end;
                    self.push(TokType::String, start, end);
                }
                c if is_id_start(c) => self.scan_name_or_string()?,
                c if c.is_ascii_digit() => self.scan_number(),
                '.' if self.source[self.pos + 1..]
                    .starts_with(|n: char| n.is_ascii_digit()) =>
                {
                    self.scan_number()
                }
                _ => self.scan_operator()?,
            }
        }

        if let Some(&open) = self.paren_stack.last() {
            return Err(TokError::UnclosedBracket { offset: open });
        }

        let end = self.source.len();
        if !matches!(
            self.tokens.last().map(|t| t.kind),
            None | Some(TokType::Newline)
        ) {
            self.push(TokType::Newline, end, end);
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokType::Dedent, end, end);
        }
        self.push(TokType::EndMarker, end, end);
        Ok(())
    }

    /// Measure indentation at the start of a logical line.
    ///
    /// Skips blank and comment-only lines. Returns `false` at end of input.
    fn handle_line_start(&mut self) -> Result<bool, TokError> {
        loop {
            let mut col = 0usize;
            while let Some(c) = self.peek_char() {
                match c {
                    ' ' => col += 1,
                    '\t' => col = (col / TAB_SIZE + 1) * TAB_SIZE,
                    '\x0c' => col = 0,
                    _ => break,
                }
                self.pos += 1;
            }

            match self.peek_char() {
                None => return Ok(false),
                Some('#') => {
                    self.skip_comment();
                    self.pos += newline_len(self.source, self.pos).unwrap_or(0);
                    continue;
                }
                Some('\n') | Some('\r') => {
                    self.pos += newline_len(self.source, self.pos).unwrap_or(1);
                    continue;
                }
                Some(_) => {}
            }

            let current = self.indent_stack.last().copied().unwrap_or(0);
            if col > current {
                self.indent_stack.push(col);
                self.push(TokType::Indent, self.pos, self.pos);
            } else if col < current {
                while self.indent_stack.last().copied().unwrap_or(0) > col {
                    self.indent_stack.pop();
                    self.push(TokType::Dedent, self.pos, self.pos);
                }
                if self.indent_stack.last().copied().unwrap_or(0) != col {
                    return Err(TokError::InconsistentDedent { offset: self.pos });
                }
            }
            return Ok(true);
        }
    }

    fn skip_comment(&mut self) {
        let rest = &self.source[self.pos..];
        let len = rest.find(['\n', '\r']).unwrap_or(rest.len());
        self.pos += len;
    }

    fn scan_name_or_string(&mut self) -> Result<(), TokError> {
        let start = self.pos;
        let mut end = start;
        for (i, c) in self.source[start..].char_indices() {
            if !is_id_continue(c) {
                break;
            }
            end = start + i + c.len_utf8();
        }

        let word = &self.source[start..end];
        let next = self.source[end..].chars().next();
        if matches!(next, Some('"') | Some('\'')) && is_string_prefix(word) {
            let string_end = scan_string_end(self.source, end, word, start)?;
            self.pos = string_end;
            self.push(TokType::String, start, string_end);
        } else {
            self.pos = end;
            self.push(TokType::Name, start, end);
        }
        Ok(())
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        let bytes = self.source.as_bytes();
        let lower = self.source[start..]
            .get(..2)
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        let radix = matches!(lower.as_str(), "0x" | "0o" | "0b");

        let mut p = start;
        while let Some(&b) = bytes.get(p) {
            if !(b.is_ascii_alphanumeric() || b == b'_' || b == b'.') {
                break;
            }
            if !radix
                && (b == b'e' || b == b'E')
                && matches!(bytes.get(p + 1), Some(b'+') | Some(b'-'))
            {
                p += 2;
                continue;
            }
            p += 1;
        }
        self.pos = p;
        self.push(TokType::Number, start, p);
    }

    fn scan_operator(&mut self) -> Result<(), TokError> {
        let start = self.pos;
        let rest = &self.source[start..];

        for op in OPERATORS_3.iter().chain(OPERATORS_2.iter()) {
            if rest.starts_with(op) {
                self.pos += op.len();
                self.push(TokType::Op, start, self.pos);
                return Ok(());
            }
        }

        let Some(c) = rest.chars().next() else {
            return Ok(());
        };
        if !OPERATORS_1.contains(c) {
            return Err(TokError::UnexpectedCharacter { ch: c, offset: start });
        }

        match c {
            '(' | '[' | '{' => self.paren_stack.push(start),
            ')' | ']' | '}' => {
                if self.paren_stack.pop().is_none() {
                    return Err(TokError::UnmatchedClosingBracket { offset: start });
                }
            }
            _ => {}
        }

        self.pos += 1;
        self.push(TokType::Op, start, self.pos);
        Ok(())
    }
}

/// Find the end of a string literal whose opening quote is at `quote_pos`.
///
/// Handles single, double and triple quotes, backslash escapes (which also
/// protect quotes in raw strings) and, for f-strings and t-strings, nested
/// replacement fields that may themselves contain strings.
fn scan_string_end(
    source: &str,
    quote_pos: usize,
    prefix: &str,
    token_start: usize,
) -> Result<usize, TokError> {
    let lower = prefix.to_ascii_lowercase();
    let formatted = lower.contains('f') || lower.contains('t');
    let bytes = source.as_bytes();
    let quote = bytes[quote_pos];
    let triple = bytes.get(quote_pos + 1) == Some(&quote) && bytes.get(quote_pos + 2) == Some(&quote);

    let unterminated = || {
        if triple {
            TokError::UnterminatedTripleQuotedString {
                offset: token_start,
            }
        } else {
            TokError::UnterminatedString {
                offset: token_start,
            }
        }
    };

    let mut p = quote_pos + if triple { 3 } else { 1 };
    loop {
        let Some(&b) = bytes.get(p) else {
            return Err(unterminated());
        };
        match b {
            b'\\' => p += 2,
            b'\n' | b'\r' if !triple => return Err(unterminated()),
            q if q == quote => {
                if !triple {
                    return Ok(p + 1);
                }
                if bytes.get(p + 1) == Some(&quote) && bytes.get(p + 2) == Some(&quote) {
                    return Ok(p + 3);
                }
                p += 1;
            }
            b'{' if formatted => {
                if bytes.get(p + 1) == Some(&b'{') {
                    p += 2;
                } else {
                    p = scan_replacement_field(source, p + 1, token_start)?;
                }
            }
            _ => p += 1,
        }
    }
}

/// Scan an f-string replacement field starting just after its `{`.
///
/// Returns the offset just past the closing `}`.
fn scan_replacement_field(source: &str, start: usize, token_start: usize) -> Result<usize, TokError> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut p = start;
    loop {
        let Some(&b) = bytes.get(p) else {
            return Err(TokError::UnterminatedString {
                offset: token_start,
            });
        };
        match b {
            b'(' | b'[' | b'{' => {
                depth += 1;
                p += 1;
            }
            b')' | b']' => {
                depth = depth.saturating_sub(1);
                p += 1;
            }
            b'}' => {
                if depth == 0 {
                    return Ok(p + 1);
                }
                depth -= 1;
                p += 1;
            }
            b'\'' | b'"' => {
                let mut q = p;
                while q > start && bytes[q - 1].is_ascii_alphabetic() {
                    q -= 1;
                }
                let prefix = &source[q..p];
                let prefix = if is_string_prefix(prefix) { prefix } else { "" };
                p = scan_string_end(source, p, prefix, token_start)?;
            }
            b':' if depth == 0 => {
                return scan_format_spec(source, p + 1, token_start);
            }
            _ => p += 1,
        }
    }
}

/// Scan a format spec (after `:` in a replacement field) up to its `}`.
fn scan_format_spec(source: &str, start: usize, token_start: usize) -> Result<usize, TokError> {
    let bytes = source.as_bytes();
    let mut p = start;
    loop {
        match bytes.get(p) {
            None => {
                return Err(TokError::UnterminatedString {
                    offset: token_start,
                })
            }
            Some(b'{') => p = scan_replacement_field(source, p + 1, token_start)?,
            Some(b'}') => return Ok(p + 1),
            Some(_) => p += 1,
        }
    }
}
