// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recursive-descent parser producing the [`Module`] tree.
//!
//! Statements, definitions, parameter lists and imports are parsed
//! structurally. Expressions are delimited by bracket depth and kept as
//! source slices, which is all the collectors and rewriters need.
//!
//! # Usage
//!
//! ```
//! use hubkit_cst::parse_module;
//!
//! let module = parse_module("def f(x, *, y=1): pass\n").unwrap();
//! assert_eq!(module.body.len(), 1);
//! assert_eq!(module.code(), "def f(x, *, y=1): pass\n");
//! ```

use hubkit_core::text::{byte_offset_to_position, line_start};
use thiserror::Error;

use crate::nodes::{
    AnnAssign, Annotation, Block, ClassDef, CompoundStatement, Decorator, DottedName, Expr,
    Expression, FunctionDef, Import, ImportAlias, ImportFrom, ImportNames, IndentedBlock, Module,
    Name, OtherExpression, OtherStatement, Param, Parameters, SimpleStatementLine,
    SimpleStatementSuite, SimpleString, SmallStatement, Span, StarArg, Statement, Suite,
};
use crate::tokenizer::{tokenize, TokError, TokType, Token};

/// Errors raised while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("tokenizer error at {line}:{col}: {error}")]
    TokenizerError { error: TokError, line: u32, col: u32 },

    #[error("invalid syntax at {line}:{col}: {message}")]
    InvalidSyntax {
        message: String,
        offset: usize,
        line: u32,
        col: u32,
    },
}

impl ParserError {
    /// 1-indexed line of the error.
    pub fn line(&self) -> u32 {
        match self {
            ParserError::TokenizerError { line, .. } | ParserError::InvalidSyntax { line, .. } => {
                *line
            }
        }
    }

    /// 1-indexed column of the error.
    pub fn col(&self) -> u32 {
        match self {
            ParserError::TokenizerError { col, .. } | ParserError::InvalidSyntax { col, .. } => {
                *col
            }
        }
    }

    /// The error description without its position.
    pub fn message(&self) -> String {
        match self {
            ParserError::TokenizerError { error, .. } => error.to_string(),
            ParserError::InvalidSyntax { message, .. } => message.clone(),
        }
    }
}

type ParseResult<T> = Result<T, ParserError>;

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Keywords that begin a simple statement which is never an expression.
const STATEMENT_KEYWORDS: &[&str] = &[
    "pass", "break", "continue", "return", "raise", "global", "nonlocal", "del", "assert",
];

const BLOCK_KEYWORDS: &[&str] = &["if", "while", "for", "try", "with"];

const CLAUSE_KEYWORDS: &[&str] = &["elif", "else", "except", "finally"];

const AUGMENTED_ASSIGN: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "@=", "&=", "|=", "^=", ">>=", "<<=", "**=",
];

fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

fn is_open_bracket(tok: &Token<'_>) -> bool {
    tok.kind == TokType::Op && matches!(tok.text, "(" | "[" | "{")
}

fn is_close_bracket(tok: &Token<'_>) -> bool {
    tok.kind == TokType::Op && matches!(tok.text, ")" | "]" | "}")
}

fn is_assignment_op(tok: &Token<'_>) -> bool {
    tok.kind == TokType::Op && (tok.text == "=" || AUGMENTED_ASSIGN.contains(&tok.text))
}

fn is_line_end(tok: &Token<'_>) -> bool {
    matches!(
        tok.kind,
        TokType::Newline | TokType::EndMarker | TokType::Indent | TokType::Dedent
    )
}

/// Parse Python source into a [`Module`].
pub fn parse_module(source: &str) -> Result<Module<'_>, ParserError> {
    let tokens = tokenize(source).map_err(|error| {
        let (line, col) = byte_offset_to_position(source, error.offset());
        ParserError::TokenizerError { error, line, col }
    })?;

    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let body = parser.parse_module_body()?;
    Ok(Module { body, source })
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    // ------------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------------

    fn peek_nth(&self, n: usize) -> Token<'a> {
        let last = self.tokens.len().saturating_sub(1);
        self.tokens[(self.pos + n).min(last)]
    }

    fn peek(&self) -> Token<'a> {
        self.peek_nth(0)
    }

    fn bump(&mut self) -> Token<'a> {
        let tok = self.peek();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .map(|i| self.tokens[i].span.end)
            .unwrap_or(0)
    }

    fn at_op(&self, op: &str) -> bool {
        self.peek().is_op(op)
    }

    fn eat_op(&mut self, op: &str) -> Option<Token<'a>> {
        if self.at_op(op) {
            Some(self.bump())
        } else {
            None
        }
    }

    fn expect_op(&mut self, op: &str) -> ParseResult<Token<'a>> {
        if self.at_op(op) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&format!("'{}'", op)))
        }
    }

    fn expect_kind(&mut self, kind: TokType, what: &str) -> ParseResult<Token<'a>> {
        if self.peek().kind == kind {
            Ok(self.bump())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<Token<'a>> {
        if self.peek().is_name(keyword) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&format!("'{}'", keyword)))
        }
    }

    fn expect_name(&mut self) -> ParseResult<Name<'a>> {
        let tok = self.peek();
        if tok.kind == TokType::Name && !is_keyword(tok.text) {
            self.bump();
            Ok(Name {
                value: tok.text,
                span: tok.span,
            })
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> ParserError {
        let (line, col) = byte_offset_to_position(self.source, offset);
        ParserError::InvalidSyntax {
            message: message.into(),
            offset,
            line,
            col,
        }
    }

    fn unexpected(&self, expected: &str) -> ParserError {
        let tok = self.peek();
        let found = match tok.kind {
            TokType::Newline => "newline".to_string(),
            TokType::Indent => "indent".to_string(),
            TokType::Dedent => "dedent".to_string(),
            TokType::EndMarker => "end of file".to_string(),
            _ => format!("'{}'", tok.text),
        };
        self.error_at(
            tok.span.start,
            format!("expected {}, found {}", expected, found),
        )
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn parse_module_body(&mut self) -> ParseResult<Vec<Statement<'a>>> {
        let mut body = Vec::new();
        while self.peek().kind != TokType::EndMarker {
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    fn parse_statement(&mut self) -> ParseResult<Statement<'a>> {
        let tok = self.peek();
        match tok.kind {
            TokType::Indent => Err(self.error_at(tok.span.start, "unexpected indent")),
            TokType::Dedent => Err(self.error_at(tok.span.start, "unexpected dedent")),
            TokType::Op if tok.text == "@" => {
                Ok(Statement::Compound(self.parse_decorated()?))
            }
            TokType::Name => match tok.text {
                "def" => {
                    let f = self.parse_function_def(Vec::new(), tok.span.start)?;
                    Ok(Statement::Compound(CompoundStatement::FunctionDef(f)))
                }
                "class" => {
                    let c = self.parse_class_def(Vec::new(), tok.span.start)?;
                    Ok(Statement::Compound(CompoundStatement::ClassDef(c)))
                }
                "async" if self.peek_nth(1).is_name("def") => {
                    let f = self.parse_function_def(Vec::new(), tok.span.start)?;
                    Ok(Statement::Compound(CompoundStatement::FunctionDef(f)))
                }
                "async" if matches!(self.peek_nth(1).text, "for" | "with") => {
                    Ok(Statement::Compound(CompoundStatement::Block(self.parse_block()?)))
                }
                kw if BLOCK_KEYWORDS.contains(&kw) => {
                    Ok(Statement::Compound(CompoundStatement::Block(self.parse_block()?)))
                }
                "match" | "case" if self.is_soft_keyword_statement() => {
                    Ok(Statement::Compound(CompoundStatement::Block(self.parse_block()?)))
                }
                kw if CLAUSE_KEYWORDS.contains(&kw) => Err(self.error_at(
                    tok.span.start,
                    format!("'{}' without a matching statement", kw),
                )),
                _ => Ok(Statement::Simple(self.parse_simple_statement_line()?)),
            },
            _ => Ok(Statement::Simple(self.parse_simple_statement_line()?)),
        }
    }

    /// `match` and `case` are keywords only when the line is a block header:
    /// a colon at bracket depth zero, with no assignment before it.
    fn is_soft_keyword_statement(&self) -> bool {
        let next = self.peek_nth(1);
        if is_line_end(&next) {
            return false;
        }
        if next.kind == TokType::Op && !matches!(next.text, "(" | "[" | "{" | "-" | "~" | "*") {
            return false;
        }

        let mut depth = 0usize;
        let mut i = 1;
        loop {
            let tok = self.peek_nth(i);
            if is_line_end(&tok) {
                return false;
            }
            if is_open_bracket(&tok) {
                depth += 1;
            } else if is_close_bracket(&tok) {
                depth = depth.saturating_sub(1);
            } else if depth == 0 {
                if tok.is_op(":") {
                    return true;
                }
                if is_assignment_op(&tok) {
                    return false;
                }
            }
            i += 1;
        }
    }

    fn parse_simple_statement_line(&mut self) -> ParseResult<SimpleStatementLine<'a>> {
        let (body, span) = self.parse_small_statements()?;
        Ok(SimpleStatementLine { body, span })
    }

    fn parse_small_statements(&mut self) -> ParseResult<(Vec<SmallStatement<'a>>, Span)> {
        let start = self.peek().span.start;
        let mut body = Vec::new();
        loop {
            body.push(self.parse_small_statement()?);
            if self.eat_op(";").is_some() && self.peek().kind != TokType::Newline {
                continue;
            }
            break;
        }
        let newline = self.expect_kind(TokType::Newline, "newline")?;
        Ok((body, Span::new(start, newline.span.end)))
    }

    fn parse_small_statement(&mut self) -> ParseResult<SmallStatement<'a>> {
        let first = self.peek();
        if first.is_name("import") {
            return Ok(SmallStatement::Import(self.parse_import()?));
        }
        if first.is_name("from") {
            return Ok(SmallStatement::ImportFrom(self.parse_import_from()?));
        }

        let from = self.pos;
        if self.scan_expression(&|t| t.is_op(";")).is_none() {
            return Err(self.unexpected("statement"));
        }
        let to = self.pos;
        let span = self.range_span(from, to);

        let is_statement_keyword =
            first.kind == TokType::Name && STATEMENT_KEYWORDS.contains(&first.text);

        if !is_statement_keyword {
            if let Some(colon) = self.find_annotation_colon(from, to) {
                return self.build_ann_assign(from, colon, to);
            }
            let has_assignment = self.find_at_depth_zero(from, to, is_assignment_op).is_some();
            if !has_assignment {
                let value = self.classify_expression(from, to);
                return Ok(SmallStatement::Expr(Expr { value, span }));
            }
        }

        Ok(SmallStatement::Other(OtherStatement {
            keyword: first.text,
            code: span.slice(self.source),
            span,
        }))
    }

    /// Index of the `:` that makes `tokens[from..to]` an annotated assignment.
    fn find_annotation_colon(&self, from: usize, to: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens[from..to].iter().enumerate() {
            if is_open_bracket(tok) {
                depth += 1;
            } else if is_close_bracket(tok) {
                depth = depth.saturating_sub(1);
            } else if depth == 0 {
                if tok.is_name("lambda") || is_assignment_op(tok) {
                    return None;
                }
                if tok.is_op(":") {
                    return (i > 0).then_some(from + i);
                }
            }
        }
        None
    }

    fn find_at_depth_zero(
        &self,
        from: usize,
        to: usize,
        pred: impl Fn(&Token<'a>) -> bool,
    ) -> Option<usize> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens[from..to].iter().enumerate() {
            if is_open_bracket(tok) {
                depth += 1;
            } else if is_close_bracket(tok) {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && pred(tok) {
                return Some(from + i);
            }
        }
        None
    }

    fn build_ann_assign(
        &self,
        from: usize,
        colon: usize,
        to: usize,
    ) -> ParseResult<SmallStatement<'a>> {
        let target = self.classify_expression(from, colon);
        let eq = self.find_at_depth_zero(colon + 1, to, |t| t.is_op("="));
        let annotation_end = eq.unwrap_or(to);
        if annotation_end <= colon + 1 {
            return Err(self.error_at(self.tokens[colon].span.end, "expected annotation"));
        }
        let annotation_span = self.range_span(colon + 1, annotation_end);
        let annotation = Annotation {
            code: annotation_span.slice(self.source),
            span: annotation_span,
        };
        let value = match eq {
            Some(eq) if eq + 1 < to => Some(self.classify_expression(eq + 1, to)),
            Some(eq) => {
                return Err(self.error_at(self.tokens[eq].span.end, "expected expression"));
            }
            None => None,
        };
        Ok(SmallStatement::AnnAssign(AnnAssign {
            target,
            annotation,
            value,
            span: self.range_span(from, to),
        }))
    }

    // ------------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------------

    fn parse_import(&mut self) -> ParseResult<Import<'a>> {
        let kw = self.bump();
        let mut names = vec![self.parse_import_alias()?];
        while self.eat_op(",").is_some() {
            names.push(self.parse_import_alias()?);
        }
        Ok(Import {
            names,
            span: Span::new(kw.span.start, self.prev_end()),
        })
    }

    fn parse_import_from(&mut self) -> ParseResult<ImportFrom<'a>> {
        let kw = self.bump();
        let mut relative = 0;
        loop {
            if self.eat_op(".").is_some() {
                relative += 1;
            } else if self.eat_op("...").is_some() {
                relative += 3;
            } else {
                break;
            }
        }

        let module = if self.peek().is_name("import") {
            None
        } else {
            Some(self.parse_dotted_name()?)
        };
        if relative == 0 && module.is_none() {
            return Err(self.unexpected("module name"));
        }
        self.expect_keyword("import")?;

        let names = if let Some(star) = self.eat_op("*") {
            ImportNames::Star(star.span)
        } else if self.eat_op("(").is_some() {
            let mut aliases = vec![self.parse_import_alias()?];
            while self.eat_op(",").is_some() {
                if self.at_op(")") {
                    break;
                }
                aliases.push(self.parse_import_alias()?);
            }
            self.expect_op(")")?;
            ImportNames::Aliases(aliases)
        } else {
            let mut aliases = vec![self.parse_import_alias()?];
            while self.eat_op(",").is_some() {
                aliases.push(self.parse_import_alias()?);
            }
            ImportNames::Aliases(aliases)
        };

        Ok(ImportFrom {
            relative,
            module,
            names,
            span: Span::new(kw.span.start, self.prev_end()),
        })
    }

    fn parse_dotted_name(&mut self) -> ParseResult<DottedName<'a>> {
        let first = self.expect_name()?;
        let mut parts = vec![first];
        while self.at_op(".") && self.peek_nth(1).kind == TokType::Name {
            self.bump();
            parts.push(self.expect_name()?);
        }
        Ok(DottedName {
            span: Span::new(first.span.start, self.prev_end()),
            parts,
        })
    }

    fn parse_import_alias(&mut self) -> ParseResult<ImportAlias<'a>> {
        let name = self.parse_dotted_name()?;
        let asname = if self.peek().is_name("as") {
            self.bump();
            Some(self.expect_name()?)
        } else {
            None
        };
        Ok(ImportAlias {
            span: Span::new(name.span.start, self.prev_end()),
            name,
            asname,
        })
    }

    // ------------------------------------------------------------------------
    // Compound statements
    // ------------------------------------------------------------------------

    fn parse_decorated(&mut self) -> ParseResult<CompoundStatement<'a>> {
        let start = self.peek().span.start;
        let mut decorators = Vec::new();
        while let Some(at) = self.eat_op("@") {
            let expression = self.parse_expression_until(&|_| false)?;
            let span = Span::new(at.span.start, self.prev_end());
            self.expect_kind(TokType::Newline, "newline")?;
            decorators.push(Decorator { expression, span });
        }

        let tok = self.peek();
        if tok.is_name("def") || (tok.is_name("async") && self.peek_nth(1).is_name("def")) {
            Ok(CompoundStatement::FunctionDef(
                self.parse_function_def(decorators, start)?,
            ))
        } else if tok.is_name("class") {
            Ok(CompoundStatement::ClassDef(
                self.parse_class_def(decorators, start)?,
            ))
        } else {
            Err(self.unexpected("function or class definition"))
        }
    }

    fn parse_function_def(
        &mut self,
        decorators: Vec<Decorator<'a>>,
        start: usize,
    ) -> ParseResult<FunctionDef<'a>> {
        let is_async = if self.peek().is_name("async") {
            self.bump();
            true
        } else {
            false
        };
        self.expect_keyword("def")?;
        let name = self.expect_name()?;
        self.skip_type_params();
        let params = self.parse_parameters()?;
        let returns = if self.eat_op("->").is_some() {
            Some(self.parse_annotation(&|t| t.is_op(":"))?)
        } else {
            None
        };
        let body = self.parse_suite()?;
        Ok(FunctionDef {
            decorators,
            is_async,
            name,
            params,
            returns,
            span: Span::new(start, body.span().end),
            body,
        })
    }

    fn parse_class_def(
        &mut self,
        decorators: Vec<Decorator<'a>>,
        start: usize,
    ) -> ParseResult<ClassDef<'a>> {
        self.expect_keyword("class")?;
        let name = self.expect_name()?;
        self.skip_type_params();
        let bases = if self.at_op("(") {
            let open = self.peek().span.start;
            self.skip_balanced();
            Some(&self.source[open..self.prev_end()])
        } else {
            None
        };
        let body = self.parse_suite()?;
        Ok(ClassDef {
            decorators,
            name,
            bases,
            span: Span::new(start, body.span().end),
            body,
        })
    }

    /// `if`/`for`/`while`/`try`/`with`/`match`/`case` plus continuation clauses.
    fn parse_block(&mut self) -> ParseResult<Block<'a>> {
        let first = self.peek();
        if first.is_name("async") {
            self.bump();
        }
        let keyword = self.peek().text;

        let mut bodies = vec![self.parse_clause()?];
        while self.peek().kind == TokType::Name && CLAUSE_KEYWORDS.contains(&self.peek().text) {
            bodies.push(self.parse_clause()?);
        }

        let end = bodies
            .last()
            .map(|b| b.span().end)
            .unwrap_or(first.span.end);
        Ok(Block {
            keyword,
            bodies,
            span: Span::new(first.span.start, end),
        })
    }

    fn parse_clause(&mut self) -> ParseResult<Suite<'a>> {
        self.bump();
        self.scan_expression(&|t| t.is_op(":"));
        self.parse_suite()
    }

    fn parse_suite(&mut self) -> ParseResult<Suite<'a>> {
        self.expect_op(":")?;

        if self.peek().kind != TokType::Newline {
            let (body, span) = self.parse_small_statements()?;
            return Ok(Suite::SimpleStatementSuite(SimpleStatementSuite { body, span }));
        }

        self.bump();
        let indent_tok = self.expect_kind(TokType::Indent, "an indented block")?;
        let indent_start = line_start(self.source, indent_tok.span.start);
        let indent = &self.source[indent_start..indent_tok.span.start];

        let mut body = Vec::new();
        while !matches!(self.peek().kind, TokType::Dedent | TokType::EndMarker) {
            body.push(self.parse_statement()?);
        }
        if self.peek().kind == TokType::Dedent {
            self.bump();
        }

        let start = body
            .first()
            .map(|s| s.span().start)
            .unwrap_or(indent_tok.span.start);
        let end = body.last().map(|s| s.span().end).unwrap_or(start);
        Ok(Suite::IndentedBlock(IndentedBlock {
            body,
            indent,
            span: Span::new(start, end),
        }))
    }

    // ------------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------------

    fn parse_parameters(&mut self) -> ParseResult<Parameters<'a>> {
        let lpar = self.expect_op("(")?.span;
        let mut posonly_params = Vec::new();
        let mut slash = None;
        let mut params = Vec::new();
        let mut star_arg = None;
        let mut kwonly_params = Vec::new();
        let mut star_kwarg = None;
        let mut trailing_comma = None;

        while !self.at_op(")") {
            let tok = self.peek();
            if tok.is_op("/") {
                self.bump();
                posonly_params.append(&mut params);
                slash = Some(tok.span);
            } else if tok.is_op("**") {
                self.bump();
                star_kwarg = Some(self.parse_param(Some(tok))?);
            } else if tok.is_op("*") {
                self.bump();
                if self.at_op(",") || self.at_op(")") {
                    star_arg = Some(StarArg::Star(tok.span));
                } else {
                    star_arg = Some(StarArg::Param(Box::new(self.parse_param(Some(tok))?)));
                }
            } else {
                let param = self.parse_param(None)?;
                if star_arg.is_some() {
                    kwonly_params.push(param);
                } else {
                    params.push(param);
                }
            }

            if let Some(comma) = self.eat_op(",") {
                if self.at_op(")") {
                    trailing_comma = Some(comma.span);
                }
            } else if !self.at_op(")") {
                return Err(self.unexpected("',' or ')'"));
            }
        }
        let rpar = self.expect_op(")")?.span;

        Ok(Parameters {
            posonly_params,
            slash,
            params,
            star_arg,
            kwonly_params,
            star_kwarg,
            lpar,
            rpar,
            trailing_comma,
        })
    }

    fn parse_param(&mut self, star: Option<Token<'a>>) -> ParseResult<Param<'a>> {
        let name = self.expect_name()?;
        let annotation = if self.eat_op(":").is_some() {
            Some(self.parse_annotation(&|t| t.is_op(",") || t.is_op("="))?)
        } else {
            None
        };
        let default = if self.eat_op("=").is_some() {
            Some(self.parse_expression_until(&|t| t.is_op(","))?)
        } else {
            None
        };
        let start = star.map(|t| t.span.start).unwrap_or(name.span.start);
        Ok(Param {
            name,
            annotation,
            default,
            star: star.map(|t| t.text).unwrap_or(""),
            span: Span::new(start, self.prev_end()),
        })
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    /// Consume tokens up to the first bracket-depth-zero token matching
    /// `stop`, an unmatched closing bracket, or the end of the line.
    ///
    /// Colons and commas belonging to a `lambda` are not stop candidates.
    /// Returns the span of the consumed tokens, or `None` if none were consumed.
    fn scan_expression(&mut self, stop: &dyn Fn(&Token<'a>) -> bool) -> Option<Span> {
        let from = self.pos;
        let mut depth = 0usize;
        let mut lambdas = 0usize;
        loop {
            let tok = self.peek();
            if is_line_end(&tok) {
                break;
            }
            if depth == 0 {
                if is_close_bracket(&tok) {
                    break;
                }
                if lambdas > 0 {
                    if tok.is_op(":") {
                        lambdas -= 1;
                    }
                } else if stop(&tok) {
                    break;
                }
                if tok.is_name("lambda") {
                    lambdas += 1;
                }
            }
            if is_open_bracket(&tok) {
                depth += 1;
            } else if is_close_bracket(&tok) {
                depth = depth.saturating_sub(1);
            }
            self.bump();
        }
        (self.pos > from).then(|| self.range_span(from, self.pos))
    }

    fn parse_expression_until(
        &mut self,
        stop: &dyn Fn(&Token<'a>) -> bool,
    ) -> ParseResult<Expression<'a>> {
        let from = self.pos;
        if self.scan_expression(stop).is_none() {
            return Err(self.unexpected("expression"));
        }
        Ok(self.classify_expression(from, self.pos))
    }

    fn parse_annotation(
        &mut self,
        stop: &dyn Fn(&Token<'a>) -> bool,
    ) -> ParseResult<Annotation<'a>> {
        match self.scan_expression(stop) {
            Some(span) => Ok(Annotation {
                code: span.slice(self.source),
                span,
            }),
            None => Err(self.unexpected("annotation")),
        }
    }

    fn range_span(&self, from: usize, to: usize) -> Span {
        match (self.tokens.get(from), to.checked_sub(1).and_then(|i| self.tokens.get(i))) {
            (Some(first), Some(last)) if to > from => Span::new(first.span.start, last.span.end),
            (Some(first), _) => Span::empty(first.span.start),
            _ => Span::empty(self.source.len()),
        }
    }

    fn classify_expression(&self, from: usize, to: usize) -> Expression<'a> {
        let span = self.range_span(from, to);
        let other = OtherExpression {
            code: span.slice(self.source),
            span,
        };
        let toks = &self.tokens[from..to];

        match toks {
            [tok] if tok.kind == TokType::Name && !is_keyword(tok.text) => Expression::Name(Name {
                value: tok.text,
                span: tok.span,
            }),
            [tok] if tok.kind == TokType::String => {
                let literal = SimpleString {
                    value: tok.text,
                    span: tok.span,
                };
                if literal.prefix().contains(['f', 'F', 't', 'T']) {
                    Expression::FormattedString(other)
                } else {
                    Expression::SimpleString(literal)
                }
            }
            [_, _, ..] if toks.iter().all(|t| t.kind == TokType::String) => {
                Expression::ConcatenatedString(other)
            }
            _ => Expression::Other(other),
        }
    }

    // ------------------------------------------------------------------------
    // Skipping
    // ------------------------------------------------------------------------

    /// Skip a balanced bracket group starting at the current open bracket.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            let tok = self.peek();
            if tok.kind == TokType::EndMarker {
                return;
            }
            self.bump();
            if is_open_bracket(&tok) {
                depth += 1;
            } else if is_close_bracket(&tok) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Skip PEP 695 type parameters: `def f[T](...)`, `class C[T]: ...`.
    fn skip_type_params(&mut self) {
        if self.at_op("[") {
            self.skip_balanced();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Module<'_> {
        parse_module(source).unwrap()
    }

    fn first_function<'m, 'a>(module: &'m Module<'a>) -> &'m FunctionDef<'a> {
        match &module.body[0] {
            Statement::Compound(CompoundStatement::FunctionDef(f)) => f,
            other => panic!("expected function, got {:?}", other),
        }
    }

    fn first_small<'m, 'a>(module: &'m Module<'a>) -> &'m SmallStatement<'a> {
        match &module.body[0] {
            Statement::Simple(line) => &line.body[0],
            other => panic!("expected simple statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_module() {
        let module = parse("");
        assert!(module.body.is_empty());
        let module = parse("# only a comment\n\n");
        assert!(module.body.is_empty());
    }

    #[test]
    fn test_code_roundtrip() {
        let source = "import os\n\n\nclass A:\n    x: int = 1  # c\n";
        assert_eq!(parse(source).code(), source);
    }

    #[test]
    fn test_parse_function_parameters_by_kind() {
        let module = parse("def f(a, /, b: int, *args, c=1, **kw) -> str:\n    pass\n");
        let f = first_function(&module);
        assert_eq!(f.name.value, "f");
        let p = &f.params;
        assert_eq!(p.posonly_params[0].name.value, "a");
        assert!(p.slash.is_some());
        assert_eq!(p.params[0].name.value, "b");
        assert_eq!(p.params[0].annotation.as_ref().unwrap().code, "int");
        match p.star_arg.as_ref().unwrap() {
            StarArg::Param(param) => assert_eq!(param.name.value, "args"),
            other => panic!("expected *args, got {:?}", other),
        }
        assert_eq!(p.kwonly_params[0].name.value, "c");
        assert_eq!(p.kwonly_params[0].default.as_ref().unwrap().code(), "1");
        assert_eq!(p.star_kwarg.as_ref().unwrap().name.value, "kw");
        assert_eq!(f.returns.as_ref().unwrap().code, "str");
        assert!(p.trailing_comma.is_none());
    }

    #[test]
    fn test_parse_bare_star_and_trailing_comma() {
        let source = "def f(\n    self,\n    x: Optional[Dict[str, int]] = None,\n    *,\n    y: int,\n):\n    pass\n";
        let module = parse(source);
        let f = first_function(&module);
        assert!(matches!(f.params.star_arg, Some(StarArg::Star(_))));
        assert_eq!(
            f.params.params[1].annotation.as_ref().unwrap().code,
            "Optional[Dict[str, int]]"
        );
        assert_eq!(f.params.kwonly_params[0].name.value, "y");
        let comma = f.params.trailing_comma.unwrap();
        assert_eq!(comma.slice(source), ",");
        assert_eq!(f.params.kwonly_params[0].span.slice(source), "y: int");
    }

    #[test]
    fn test_parse_lambda_default() {
        let module = parse("def f(key=lambda a, b: a, other=2): pass\n");
        let f = first_function(&module);
        assert_eq!(f.params.params.len(), 2);
        assert_eq!(
            f.params.params[0].default.as_ref().unwrap().code(),
            "lambda a, b: a"
        );
    }

    #[test]
    fn test_parse_ann_assign_with_value() {
        let module = parse("model: Optional[\"ChatCompletionModel\"] = None\n");
        match first_small(&module) {
            SmallStatement::AnnAssign(a) => {
                assert!(matches!(a.target, Expression::Name(n) if n.value == "model"));
                assert_eq!(a.annotation.code, "Optional[\"ChatCompletionModel\"]");
                assert_eq!(a.value.as_ref().unwrap().code(), "None");
            }
            other => panic!("expected AnnAssign, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_assignment_is_other() {
        let module = parse("x = lambda: 1\n");
        assert!(matches!(first_small(&module), SmallStatement::Other(o) if o.keyword == "x"));
    }

    #[test]
    fn test_parse_dict_literal_is_expression() {
        let module = parse("{'a': 1}\n");
        assert!(matches!(first_small(&module), SmallStatement::Expr(_)));
    }

    #[test]
    fn test_parse_docstring_expression() {
        let module = parse("\"\"\"Module doc.\"\"\"\n");
        match first_small(&module) {
            SmallStatement::Expr(e) => match &e.value {
                Expression::SimpleString(s) => assert_eq!(s.evaluated_value(), "Module doc."),
                other => panic!("expected string, got {:?}", other),
            },
            other => panic!("expected Expr, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_string_kinds() {
        let module = parse("f'x'\n'a' 'b'\n");
        let kinds: Vec<&Expression<'_>> = module
            .body
            .iter()
            .map(|s| match s {
                Statement::Simple(line) => match &line.body[0] {
                    SmallStatement::Expr(e) => &e.value,
                    other => panic!("unexpected {:?}", other),
                },
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert!(matches!(kinds[0], Expression::FormattedString(_)));
        assert!(matches!(kinds[1], Expression::ConcatenatedString(_)));
    }

    #[test]
    fn test_parse_imports() {
        let module = parse("import os.path as p, sys\nfrom ..pkg.mod import (a as b,\n    c,)\nfrom . import x\nfrom m import *\n");
        match &module.body[0] {
            Statement::Simple(line) => match &line.body[0] {
                SmallStatement::Import(i) => {
                    assert_eq!(i.names[0].name.value(), "os.path");
                    assert_eq!(i.names[0].bound_name(), "p");
                    assert_eq!(i.names[1].name.value(), "sys");
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
        match &module.body[1] {
            Statement::Simple(line) => match &line.body[0] {
                SmallStatement::ImportFrom(i) => {
                    assert_eq!(i.relative, 2);
                    assert_eq!(i.module.as_ref().unwrap().value(), "pkg.mod");
                    match &i.names {
                        ImportNames::Aliases(aliases) => {
                            assert_eq!(aliases.len(), 2);
                            assert_eq!(aliases[0].bound_name(), "b");
                            assert_eq!(aliases[1].name.value(), "c");
                        }
                        other => panic!("unexpected {:?}", other),
                    }
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
        assert!(module.body.iter().all(|s| s.is_import()));
    }

    #[test]
    fn test_parse_class_with_bases_and_decorators() {
        let source = "@dataclass\nclass TextParameters(BaseInferenceType):\n    x: int\n";
        let module = parse(source);
        match &module.body[0] {
            Statement::Compound(CompoundStatement::ClassDef(c)) => {
                assert_eq!(c.name.value, "TextParameters");
                assert_eq!(c.bases, Some("(BaseInferenceType)"));
                assert_eq!(c.decorators.len(), 1);
                assert_eq!(c.decorators[0].expression.code(), "dataclass");
                assert_eq!(c.span.start, 0);
                assert_eq!(c.span.end, source.len());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_blocks_with_clauses() {
        let source = "if a:\n    x = 1\nelif b:\n    pass\nelse:\n    y = 2\ntry:\n    z\nexcept E as e:\n    pass\nfinally:\n    pass\n";
        let module = parse(source);
        assert_eq!(module.body.len(), 2);
        match &module.body[0] {
            Statement::Compound(CompoundStatement::Block(b)) => {
                assert_eq!(b.keyword, "if");
                assert_eq!(b.bodies.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &module.body[1] {
            Statement::Compound(CompoundStatement::Block(b)) => {
                assert_eq!(b.keyword, "try");
                assert_eq!(b.bodies.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_match_soft_keyword() {
        let source = "match = 1\nmatch command:\n    case [x, *rest]:\n        pass\n    case _: pass\n";
        let module = parse(source);
        assert!(matches!(&module.body[0], Statement::Simple(_)));
        match &module.body[1] {
            Statement::Compound(CompoundStatement::Block(b)) => {
                assert_eq!(b.keyword, "match");
                match &b.bodies[0] {
                    Suite::IndentedBlock(block) => assert_eq!(block.body.len(), 2),
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_async_def_and_nested_methods() {
        let source = "class C:\n    async def run(self) -> None:\n        \"\"\"Doc.\"\"\"\n        await x\n";
        let module = parse(source);
        match &module.body[0] {
            Statement::Compound(CompoundStatement::ClassDef(c)) => match &c.body {
                Suite::IndentedBlock(block) => {
                    assert_eq!(block.indent, "    ");
                    match &block.body[0] {
                        Statement::Compound(CompoundStatement::FunctionDef(f)) => {
                            assert!(f.is_async);
                            assert_eq!(f.name.value, "run");
                        }
                        other => panic!("unexpected {:?}", other),
                    }
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_semicolon_statements() {
        let module = parse("import a; x = 1;\n");
        match &module.body[0] {
            Statement::Simple(line) => assert_eq!(line.body.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        assert!(module.body[0].is_import());
    }

    #[test]
    fn test_parse_error_unexpected_indent() {
        let err = parse_module("x = 1\n    y = 2\n").unwrap_err();
        assert_eq!(err.line(), 2);
        assert_eq!(err.message(), "unexpected indent");
    }

    #[test]
    fn test_parse_error_missing_colon() {
        let err = parse_module("def f()\n    pass\n").unwrap_err();
        assert!(matches!(err, ParserError::InvalidSyntax { .. }));
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_parse_error_from_tokenizer() {
        let err = parse_module("x = (\n").unwrap_err();
        assert!(matches!(err, ParserError::TokenizerError { .. }));
        assert_eq!((err.line(), err.col()), (1, 5));
    }
}
