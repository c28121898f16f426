// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Syntax tree node types.
//!
//! The tree is shallow by intent: statements, definitions, parameters,
//! imports and string literals are modeled structurally, while arbitrary
//! expressions are kept as source slices ([`OtherExpression`]). Every node
//! records the byte [`Span`] it covers, so source text is never duplicated and
//! rewrites are expressed as span edits against [`Module::code`].

pub use hubkit_core::patch::Span;

// ============================================================================
// Module and statements
// ============================================================================

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module<'a> {
    /// Top-level statements in source order.
    pub body: Vec<Statement<'a>>,
    /// The full source text the module was parsed from.
    pub source: &'a str,
}

impl<'a> Module<'a> {
    /// The module's source code. An unmodified tree always renders back to
    /// exactly the text it was parsed from.
    pub fn code(&self) -> &'a str {
        self.source
    }
}

/// A top-level or block-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'a> {
    Simple(SimpleStatementLine<'a>),
    Compound(CompoundStatement<'a>),
}

impl<'a> Statement<'a> {
    pub fn span(&self) -> Span {
        match self {
            Statement::Simple(s) => s.span,
            Statement::Compound(c) => c.span(),
        }
    }

    /// True if this line starts with `import` or `from ... import`.
    pub fn is_import(&self) -> bool {
        match self {
            Statement::Simple(line) => matches!(
                line.body.first(),
                Some(SmallStatement::Import(_)) | Some(SmallStatement::ImportFrom(_))
            ),
            Statement::Compound(_) => false,
        }
    }
}

/// One logical line of `;`-separated small statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleStatementLine<'a> {
    pub body: Vec<SmallStatement<'a>>,
    /// Covers the statements and the terminating newline.
    pub span: Span,
}

/// A statement that fits on one logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmallStatement<'a> {
    Import(Import<'a>),
    ImportFrom(ImportFrom<'a>),
    AnnAssign(AnnAssign<'a>),
    Expr(Expr<'a>),
    /// Any other simple statement (assignment, `return`, `pass`, ...).
    Other(OtherStatement<'a>),
}

impl<'a> SmallStatement<'a> {
    pub fn span(&self) -> Span {
        match self {
            SmallStatement::Import(n) => n.span,
            SmallStatement::ImportFrom(n) => n.span,
            SmallStatement::AnnAssign(n) => n.span,
            SmallStatement::Expr(n) => n.span,
            SmallStatement::Other(n) => n.span,
        }
    }
}

/// A simple statement kept as source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherStatement<'a> {
    /// Leading keyword or first token (`return`, `pass`, `x`, ...).
    pub keyword: &'a str,
    pub code: &'a str,
    pub span: Span,
}

/// `import a.b as c, d`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import<'a> {
    pub names: Vec<ImportAlias<'a>>,
    pub span: Span,
}

/// `from .mod import a as b, c` or `from mod import *`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFrom<'a> {
    /// Number of leading dots.
    pub relative: usize,
    /// `None` for `from . import x`.
    pub module: Option<DottedName<'a>>,
    pub names: ImportNames<'a>,
    pub span: Span,
}

/// The imported names of a `from` import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportNames<'a> {
    Star(Span),
    Aliases(Vec<ImportAlias<'a>>),
}

/// `name` or `name as alias` inside an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAlias<'a> {
    pub name: DottedName<'a>,
    pub asname: Option<Name<'a>>,
    pub span: Span,
}

impl<'a> ImportAlias<'a> {
    /// The name this alias binds in the importing module.
    pub fn bound_name(&self) -> String {
        match &self.asname {
            Some(alias) => alias.value.to_string(),
            None => self.name.value(),
        }
    }
}

/// A dotted name such as `huggingface_hub.inference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedName<'a> {
    pub parts: Vec<Name<'a>>,
    pub span: Span,
}

impl<'a> DottedName<'a> {
    /// The dotted name as a string, without interior whitespace.
    pub fn value(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.value)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// `target: annotation [= value]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnAssign<'a> {
    pub target: Expression<'a>,
    pub annotation: Annotation<'a>,
    pub value: Option<Expression<'a>>,
    pub span: Span,
}

/// An expression used as a statement (docstrings, calls, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr<'a> {
    pub value: Expression<'a>,
    pub span: Span,
}

// ============================================================================
// Compound statements
// ============================================================================

/// A statement that owns one or more indented suites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompoundStatement<'a> {
    FunctionDef(FunctionDef<'a>),
    ClassDef(ClassDef<'a>),
    /// `if`, `for`, `while`, `try`, `with`, `match`, `case` with all of
    /// their continuation clauses.
    Block(Block<'a>),
}

impl<'a> CompoundStatement<'a> {
    pub fn span(&self) -> Span {
        match self {
            CompoundStatement::FunctionDef(f) => f.span,
            CompoundStatement::ClassDef(c) => c.span,
            CompoundStatement::Block(b) => b.span,
        }
    }
}

/// `def name(params) -> returns: body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef<'a> {
    pub decorators: Vec<Decorator<'a>>,
    pub is_async: bool,
    pub name: Name<'a>,
    pub params: Parameters<'a>,
    pub returns: Option<Annotation<'a>>,
    pub body: Suite<'a>,
    /// From the first decorator (or `async`/`def`) to the end of the body.
    pub span: Span,
}

/// `class Name(bases): body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef<'a> {
    pub decorators: Vec<Decorator<'a>>,
    pub name: Name<'a>,
    /// Source of the parenthesized base list, including parentheses.
    pub bases: Option<&'a str>,
    pub body: Suite<'a>,
    pub span: Span,
}

/// `@expression`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorator<'a> {
    pub expression: Expression<'a>,
    pub span: Span,
}

/// A control-flow compound statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    /// Leading keyword (`if`, `try`, `match`, ...).
    pub keyword: &'a str,
    /// One suite per clause, in source order.
    pub bodies: Vec<Suite<'a>>,
    pub span: Span,
}

/// The body of a compound statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suite<'a> {
    IndentedBlock(IndentedBlock<'a>),
    SimpleStatementSuite(SimpleStatementSuite<'a>),
}

impl<'a> Suite<'a> {
    pub fn span(&self) -> Span {
        match self {
            Suite::IndentedBlock(b) => b.span,
            Suite::SimpleStatementSuite(s) => s.span,
        }
    }
}

/// An indented block of statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentedBlock<'a> {
    pub body: Vec<Statement<'a>>,
    /// Indentation of the block's statements.
    pub indent: &'a str,
    /// From the first statement to the newline of the last statement.
    pub span: Span,
}

/// Statements on the same line as the header: `if x: a; b`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleStatementSuite<'a> {
    pub body: Vec<SmallStatement<'a>>,
    pub span: Span,
}

// ============================================================================
// Parameters
// ============================================================================

/// A function's parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters<'a> {
    /// Parameters before `/`.
    pub posonly_params: Vec<Param<'a>>,
    /// Span of the `/` marker, if any.
    pub slash: Option<Span>,
    /// Regular parameters.
    pub params: Vec<Param<'a>>,
    /// `*args` or a bare `*`.
    pub star_arg: Option<StarArg<'a>>,
    /// Parameters after `*` or `*args`.
    pub kwonly_params: Vec<Param<'a>>,
    /// `**kwargs`.
    pub star_kwarg: Option<Param<'a>>,
    /// Span of the opening parenthesis.
    pub lpar: Span,
    /// Span of the closing parenthesis.
    pub rpar: Span,
    /// Span of a comma directly before the closing parenthesis.
    pub trailing_comma: Option<Span>,
}

impl<'a> Parameters<'a> {
    /// Every named parameter in source order, including `*args` and `**kwargs`.
    pub fn all_params(&self) -> Vec<&Param<'a>> {
        let mut out: Vec<&Param<'a>> = Vec::new();
        out.extend(self.posonly_params.iter());
        out.extend(self.params.iter());
        if let Some(StarArg::Param(p)) = &self.star_arg {
            out.push(p);
        }
        out.extend(self.kwonly_params.iter());
        if let Some(p) = &self.star_kwarg {
            out.push(p);
        }
        out
    }

    /// Names a caller can already pass, `self` excluded.
    ///
    /// Covers every parameter kind, so a name listed here is never added
    /// again as a keyword-only parameter.
    pub fn declared_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.all_params()
            .into_iter()
            .map(|p| p.name.value)
            .filter(|name| *name != "self")
    }

    /// Span of the last parameter-like element (including a bare `*` or `/`).
    pub fn last_element_span(&self) -> Option<Span> {
        let mut spans: Vec<Span> = self.all_params().iter().map(|p| p.span).collect();
        if let Some(StarArg::Star(span)) = &self.star_arg {
            spans.push(*span);
        }
        if let Some(span) = self.slash {
            spans.push(span);
        }
        spans.into_iter().max_by_key(|s| s.end)
    }

    /// True if the list contains no parameters at all.
    pub fn is_empty(&self) -> bool {
        self.last_element_span().is_none()
    }
}

/// `*args` or a bare `*` separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StarArg<'a> {
    /// Bare `*`.
    Star(Span),
    /// `*args`.
    Param(Box<Param<'a>>),
}

/// A single named parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param<'a> {
    pub name: Name<'a>,
    pub annotation: Option<Annotation<'a>>,
    pub default: Option<Expression<'a>>,
    /// `""`, `"*"` or `"**"`.
    pub star: &'a str,
    /// From the star (or name) to the end of the default (or annotation).
    pub span: Span,
}

/// A type annotation, kept as source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation<'a> {
    /// The annotation expression exactly as written.
    pub code: &'a str,
    pub span: Span,
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression<'a> {
    Name(Name<'a>),
    SimpleString(SimpleString<'a>),
    /// An f-string or t-string literal.
    FormattedString(OtherExpression<'a>),
    /// Two or more adjacent string literals.
    ConcatenatedString(OtherExpression<'a>),
    /// Any other expression, kept as source text.
    Other(OtherExpression<'a>),
}

impl<'a> Expression<'a> {
    pub fn span(&self) -> Span {
        match self {
            Expression::Name(n) => n.span,
            Expression::SimpleString(s) => s.span,
            Expression::FormattedString(o)
            | Expression::ConcatenatedString(o)
            | Expression::Other(o) => o.span,
        }
    }

    /// Source text of the expression.
    pub fn code(&self) -> &'a str {
        match self {
            Expression::Name(n) => n.value,
            Expression::SimpleString(s) => s.value,
            Expression::FormattedString(o)
            | Expression::ConcatenatedString(o)
            | Expression::Other(o) => o.code,
        }
    }
}

/// An identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Name<'a> {
    pub value: &'a str,
    pub span: Span,
}

/// An expression kept as source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherExpression<'a> {
    pub code: &'a str,
    pub span: Span,
}

/// A single, non-formatted string literal such as `"abc"` or `r'''x'''`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleString<'a> {
    /// The literal exactly as written, prefix and quotes included.
    pub value: &'a str,
    pub span: Span,
}

impl<'a> SimpleString<'a> {
    /// The literal's prefix (`r`, `b`, `rb`, `u`, or empty).
    pub fn prefix(&self) -> &'a str {
        let end = self
            .value
            .find(['"', '\''])
            .unwrap_or(0);
        &self.value[..end]
    }

    /// The opening quote sequence: `'`, `"`, `'''` or `"""`.
    pub fn quote(&self) -> &'a str {
        let rest = &self.value[self.prefix().len()..];
        if rest.starts_with("\"\"\"") {
            "\"\"\""
        } else if rest.starts_with("'''") {
            "'''"
        } else if rest.starts_with('"') {
            "\""
        } else {
            "'"
        }
    }

    /// True for `'''` and `"""` literals.
    pub fn is_triple_quoted(&self) -> bool {
        self.quote().len() == 3
    }

    /// True if the prefix contains `r` or `R`.
    pub fn is_raw(&self) -> bool {
        self.prefix().contains(['r', 'R'])
    }

    /// The raw text between the quotes, escapes left untouched.
    pub fn inner(&self) -> &'a str {
        let start = self.prefix().len() + self.quote().len();
        let end = self.value.len().saturating_sub(self.quote().len());
        self.value.get(start..end).unwrap_or("")
    }

    /// The string's runtime value, with escape sequences decoded.
    pub fn evaluated_value(&self) -> String {
        if self.is_raw() {
            self.inner().to_string()
        } else {
            unescape(self.inner())
        }
    }
}

/// Decode Python escape sequences. Unknown escapes are kept verbatim.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let decoded = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}
