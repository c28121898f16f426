// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! AddParametersTransformer: extend a method with keyword-only parameters.
//!
//! For every definition of the target method the transformer records two
//! edits against the original source:
//!
//! 1. **Signature**: each new field becomes `name: <annotation> = None` after
//!    the existing keyword-only parameters and before `**kwargs`. A bare `*`
//!    is added first when the signature has no `*` or `*args`. The layout of
//!    the parameter list (one per line, or inline) is kept.
//! 2. **Docstring**: an entry per new field is added under `Args:`, creating
//!    the section before the first `Returns:`/`Raises:`/`Examples:` header
//!    when it does not exist.
//!
//! ```
//! use hubkit_cst::parse_module;
//! use hubkit_cst::visitor::{transform_module, AddParametersTransformer, FieldInfo};
//!
//! let source = "def f(self, x: int):\n    pass\n";
//! let module = parse_module(source).unwrap();
//! let field = FieldInfo {
//!     name: "top_k".to_string(),
//!     annotation: "Optional[int]".to_string(),
//!     description: String::new(),
//! };
//! let mut t = AddParametersTransformer::new("f", vec![field]);
//! let out = transform_module(&mut t, &module).unwrap();
//! assert_eq!(out, "def f(self, x: int, *, top_k: Optional[int] = None):\n    pass\n");
//! ```

use hubkit_core::text::leading_whitespace;
use tracing::debug;

use super::batch_edit::{detect_indentation, EditPrimitive};
use super::dataclass::FieldInfo;
use super::traits::{Transformer, VisitResult, Visitor};
use crate::annotation::strip_optional;
use crate::nodes::{
    Expression, FunctionDef, Module, Parameters, SimpleString, SmallStatement, Statement, Suite,
};

/// Lines that end the `Args:` section of a docstring.
const TERMINAL_HEADERS: &[&str] = &["returns:", "raises:", "examples:", "example:"];

/// Adds the given fields as keyword-only parameters of `method_name`.
pub struct AddParametersTransformer<'a> {
    method_name: String,
    missing: Vec<FieldInfo>,
    source: &'a str,
    rewritten: usize,
    edits: Vec<EditPrimitive>,
}

impl<'a> AddParametersTransformer<'a> {
    pub fn new(method_name: impl Into<String>, missing: Vec<FieldInfo>) -> Self {
        Self {
            method_name: method_name.into(),
            missing,
            source: "",
            rewritten: 0,
            edits: Vec::new(),
        }
    }

    /// Number of definitions that received new parameters.
    pub fn rewritten(&self) -> usize {
        self.rewritten
    }

    fn docstring_edit(&self, body: &Suite<'a>, fields: &[&FieldInfo]) -> Option<EditPrimitive> {
        let Suite::IndentedBlock(block) = body else {
            return None;
        };
        let Some(Statement::Simple(line)) = block.body.first() else {
            return None;
        };
        let Some(SmallStatement::Expr(expr)) = line.body.first() else {
            return None;
        };
        let Expression::SimpleString(docstring) = &expr.value else {
            return None;
        };

        let quote = docstring_quote(docstring);
        let inner = update_docstring(docstring.inner(), fields, block.indent, &|text| {
            escape_description(text, docstring.is_raw(), quote)
        });
        Some(EditPrimitive::Replace {
            span: docstring.span,
            new_text: format!("{}{quote}{inner}{quote}", docstring.prefix()),
        })
    }
}

impl<'a> Visitor<'a> for AddParametersTransformer<'a> {
    fn visit_module(&mut self, node: &Module<'a>) -> VisitResult {
        self.source = node.source;
        VisitResult::Continue
    }

    fn visit_function_def(&mut self, node: &FunctionDef<'a>) -> VisitResult {
        if node.name.value != self.method_name {
            return VisitResult::Continue;
        }

        let existing: Vec<&str> = node.params.declared_names().collect();
        let fields: Vec<&FieldInfo> = self
            .missing
            .iter()
            .filter(|f| !existing.contains(&f.name.as_str()))
            .collect();
        if fields.is_empty() {
            return VisitResult::SkipChildren;
        }

        debug!(
            method = %self.method_name,
            added = fields.len(),
            "adding keyword-only parameters"
        );
        let signature = signature_edit(self.source, &node.params, &fields);
        let docstring = self.docstring_edit(&node.body, &fields);
        self.edits.push(signature);
        self.edits.extend(docstring);
        self.rewritten += 1;
        VisitResult::SkipChildren
    }
}

impl<'a> Transformer<'a> for AddParametersTransformer<'a> {
    fn take_edits(&mut self) -> Vec<EditPrimitive> {
        std::mem::take(&mut self.edits)
    }
}

/// The insertion adding `fields` to a parameter list.
fn signature_edit(source: &str, params: &Parameters<'_>, fields: &[&FieldInfo]) -> EditPrimitive {
    let mut items: Vec<String> = Vec::with_capacity(fields.len() + 1);
    if params.star_arg.is_none() {
        items.push("*".to_string());
    }
    items.extend(
        fields
            .iter()
            .map(|f| format!("{}: {} = None", f.name, f.annotation)),
    );

    let multiline = source
        .get(params.lpar.end..params.rpar.start)
        .is_some_and(|inside| inside.contains('\n'));

    if let Some(kwargs) = &params.star_kwarg {
        let position = kwargs.span.start;
        let text = if multiline {
            let indent = detect_indentation(source, position);
            items.iter().map(|item| format!("{item},\n{indent}")).collect()
        } else {
            items.iter().map(|item| format!("{item}, ")).collect()
        };
        return EditPrimitive::InsertAt { position, text };
    }

    match params.last_element_span() {
        Some(last) => {
            let text = if multiline {
                let indent = detect_indentation(source, last.start);
                items.iter().map(|item| format!(",\n{indent}{item}")).collect()
            } else {
                items.iter().map(|item| format!(", {item}")).collect()
            };
            EditPrimitive::InsertAt {
                position: last.end,
                text,
            }
        }
        None => EditPrimitive::InsertAt {
            position: params.lpar.end,
            text: items.join(", "),
        },
    }
}

/// Quote sequence for the rewritten docstring.
fn docstring_quote(docstring: &SimpleString<'_>) -> &'static str {
    if docstring.is_triple_quoted() {
        if docstring.quote() == "'''" {
            "'''"
        } else {
            "\"\"\""
        }
    } else if docstring.inner().ends_with('"') || docstring.inner().contains("\"\"\"") {
        "'''"
    } else {
        "\"\"\""
    }
}

/// Make a description line safe to place inside the literal.
fn escape_description(text: &str, raw: bool, quote: &str) -> String {
    if raw {
        return text.to_string();
    }
    let escaped = text.replace('\\', "\\\\");
    let quote_char = &quote[..1];
    escaped.replace(quote, &format!("\\{quote_char}").repeat(quote.len()))
}

fn is_terminal_header(line: &str) -> bool {
    TERMINAL_HEADERS.contains(&line.trim().to_ascii_lowercase().as_str())
}

/// Add `Args:` entries for `fields` to the raw docstring body `inner`.
///
/// `block_indent` is the indentation of the function body, used when the
/// docstring itself gives no hint.
fn update_docstring(
    inner: &str,
    fields: &[&FieldInfo],
    block_indent: &str,
    escape: &dyn Fn(&str) -> String,
) -> String {
    let mut lines: Vec<String> = inner.split('\n').map(str::to_string).collect();
    let has_closing_line = lines.len() > 1 && lines.last().is_some_and(|l| l.trim().is_empty());
    let end_index = if has_closing_line {
        lines.len() - 1
    } else {
        lines.len()
    };

    let args_index = lines
        .iter()
        .position(|l| l.trim().eq_ignore_ascii_case("args:"));
    let header_index = lines.iter().position(|l| is_terminal_header(l));

    let mut new_lines: Vec<String> = Vec::new();
    let (args_indent, insert_at) = match (args_index, header_index) {
        (Some(args), _) => {
            let at = (args + 1..end_index)
                .find(|&i| {
                    lines[i].trim().is_empty()
                        && lines.get(i + 1).is_some_and(|next| is_terminal_header(next))
                })
                .unwrap_or(end_index);
            (leading_whitespace(&lines[args]).to_string(), at)
        }
        (None, Some(header)) => {
            let indent = leading_whitespace(&lines[header]).to_string();
            new_lines.push(format!("{indent}Args:"));
            (indent, header)
        }
        (None, None) => {
            let indent = body_indent(&lines, has_closing_line, block_indent);
            if end_index > 0 && !lines[end_index - 1].trim().is_empty() {
                new_lines.push(String::new());
            }
            new_lines.push(format!("{indent}Args:"));
            (indent, end_index)
        }
    };

    let entry_indent = format!("{args_indent}    ");
    for field in fields {
        let (bare, optional) = strip_optional(&field.annotation);
        let marker = if optional { "*optional*" } else { "" };
        new_lines.push(format!("{entry_indent}{} (`{bare}`, {marker}):", field.name));
        let mut description = field.description.lines().map(str::trim);
        let first = description.next().unwrap_or_default();
        new_lines.push(format!("{entry_indent}    {}", escape(first)));
        for line in description {
            if line.is_empty() {
                new_lines.push(String::new());
            } else {
                new_lines.push(format!("{entry_indent}    {}", escape(line)));
            }
        }
    }

    lines.splice(insert_at..insert_at, new_lines);
    if !has_closing_line {
        lines.push(block_indent.to_string());
    }
    lines.join("\n")
}

/// Indentation for a new `Args:` section appended at the end of a docstring.
fn body_indent(lines: &[String], has_closing_line: bool, block_indent: &str) -> String {
    if has_closing_line {
        if let Some(last) = lines.last() {
            return leading_whitespace(last).to_string();
        }
    }
    lines
        .iter()
        .skip(1)
        .find(|l| !l.trim().is_empty())
        .map(|l| leading_whitespace(l).to_string())
        .unwrap_or_else(|| block_indent.to_string())
}
