// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! DataclassFieldCollector visitor for record field extraction.
//!
//! Collects the annotated fields of one named top-level class, in
//! declaration order, together with the string literal documenting each
//! field:
//!
//! ```text
//! @dataclass
//! class TextClassificationParameters(BaseInferenceType):
//!     top_k: Optional[int] = None
//!     """When specified, limits the output to the top K most probable classes."""
//! ```
//!
//! # Usage
//!
//! ```
//! use hubkit_cst::parse_module;
//! use hubkit_cst::visitor::DataclassFieldCollector;
//!
//! let source = "class P:\n    top_k: Optional[int] = None\n    \"\"\"Top K.\"\"\"\n";
//! let module = parse_module(source).unwrap();
//! let fields = DataclassFieldCollector::collect(&module, "P");
//! assert_eq!(fields[0].name, "top_k");
//! assert_eq!(fields[0].annotation, "Optional[int]");
//! assert_eq!(fields[0].description, "Top K.");
//! ```

use serde::Serialize;

use super::dispatch::walk_module;
use super::traits::{VisitResult, Visitor};
use crate::nodes::{
    ClassDef, Expression, FunctionDef, Module, SmallStatement, Statement, Suite,
};

/// A typed field of a record declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    /// Field name.
    pub name: String,
    /// The annotation exactly as written.
    pub annotation: String,
    /// Trimmed text of the string literal following the field, or empty.
    pub description: String,
}

/// A visitor collecting the fields of one class.
///
/// Only classes at module level are considered, including those nested in
/// module-level `if`/`try` blocks. On duplicate field names the first
/// occurrence wins.
pub struct DataclassFieldCollector {
    class_name: String,
    fields: Vec<FieldInfo>,
}

impl DataclassFieldCollector {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: Vec::new(),
        }
    }

    /// Collect the fields of `class_name`. Empty if the class is not found.
    pub fn collect(module: &Module<'_>, class_name: &str) -> Vec<FieldInfo> {
        let mut collector = DataclassFieldCollector::new(class_name);
        walk_module(&mut collector, module);
        collector.fields
    }

    pub fn into_fields(self) -> Vec<FieldInfo> {
        self.fields
    }

    fn collect_body(&mut self, body: &[Statement<'_>]) {
        for (index, statement) in body.iter().enumerate() {
            let Statement::Simple(line) = statement else {
                continue;
            };
            for small in &line.body {
                let SmallStatement::AnnAssign(assign) = small else {
                    continue;
                };
                let Expression::Name(target) = &assign.target else {
                    continue;
                };
                if self.fields.iter().any(|f| f.name == target.value) {
                    continue;
                }
                self.fields.push(FieldInfo {
                    name: target.value.to_string(),
                    annotation: assign.annotation.code.to_string(),
                    description: body.get(index + 1).map(description_of).unwrap_or_default(),
                });
            }
        }
    }
}

/// The trimmed value of a bare string literal statement, or empty.
fn description_of(statement: &Statement<'_>) -> String {
    let Statement::Simple(line) = statement else {
        return String::new();
    };
    line.body
        .iter()
        .find_map(|small| match small {
            SmallStatement::Expr(expr) => match &expr.value {
                Expression::SimpleString(s) => Some(s.evaluated_value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .unwrap_or_default()
}

impl<'a> Visitor<'a> for DataclassFieldCollector {
    fn visit_class_def(&mut self, node: &ClassDef<'a>) -> VisitResult {
        if node.name.value == self.class_name {
            match &node.body {
                Suite::IndentedBlock(block) => self.collect_body(&block.body),
                Suite::SimpleStatementSuite(_) => {}
            }
        }
        VisitResult::SkipChildren
    }

    fn visit_function_def(&mut self, _node: &FunctionDef<'a>) -> VisitResult {
        VisitResult::SkipChildren
    }
}
