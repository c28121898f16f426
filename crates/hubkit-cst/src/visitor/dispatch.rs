// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Walk functions driving a [`Visitor`] over the tree.
//!
//! Every `walk_*` function calls `visit_*`, descends into the node's children
//! in source order unless told otherwise, then calls `leave_*`. A `Stop` from
//! any visit unwinds the whole walk without further callbacks.

use super::batch_edit::{BatchEditOptions, BatchEditResult, BatchSpanEditor};
use super::traits::{Transformer, VisitResult, Visitor};
use crate::nodes::{
    AnnAssign, Annotation, Block, ClassDef, CompoundStatement, Decorator, Expr, Expression,
    FunctionDef, Import, ImportAlias, ImportFrom, ImportNames, IndentedBlock, Module, Name,
    Param, Parameters, SimpleStatementLine, SimpleStatementSuite, SimpleString, SmallStatement,
    Statement, Suite,
};

/// Return early from the enclosing walk function when a child walk stopped.
macro_rules! walk_child {
    ($walk:expr) => {
        if $walk == VisitResult::Stop {
            return VisitResult::Stop;
        }
    };
}

/// Run `visit`, then `children` unless skipped, then `leave`.
macro_rules! walk_node {
    ($visitor:ident, $node:ident, $visit:ident, $leave:ident, $children:block) => {{
        match $visitor.$visit($node) {
            VisitResult::Stop => return VisitResult::Stop,
            VisitResult::SkipChildren => {}
            VisitResult::Continue => $children,
        }
        $visitor.$leave($node);
        VisitResult::Continue
    }};
}

// ============================================================================
// Module and statements
// ============================================================================

pub fn walk_module<'a, V: Visitor<'a>>(visitor: &mut V, node: &Module<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_module, leave_module, {
        for statement in &node.body {
            walk_child!(walk_statement(visitor, statement));
        }
    })
}

pub fn walk_statement<'a, V: Visitor<'a>>(visitor: &mut V, node: &Statement<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_statement, leave_statement, {
        match node {
            Statement::Simple(line) => walk_child!(walk_simple_statement_line(visitor, line)),
            Statement::Compound(compound) => {
                walk_child!(walk_compound_statement(visitor, compound))
            }
        }
    })
}

pub fn walk_simple_statement_line<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &SimpleStatementLine<'a>,
) -> VisitResult {
    walk_node!(
        visitor,
        node,
        visit_simple_statement_line,
        leave_simple_statement_line,
        {
            for small in &node.body {
                walk_child!(walk_small_statement(visitor, small));
            }
        }
    )
}

pub fn walk_small_statement<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &SmallStatement<'a>,
) -> VisitResult {
    walk_node!(visitor, node, visit_small_statement, leave_small_statement, {
        match node {
            SmallStatement::Import(import) => walk_child!(walk_import(visitor, import)),
            SmallStatement::ImportFrom(import) => walk_child!(walk_import_from(visitor, import)),
            SmallStatement::AnnAssign(assign) => walk_child!(walk_ann_assign(visitor, assign)),
            SmallStatement::Expr(expr) => walk_child!(walk_expr(visitor, expr)),
            SmallStatement::Other(_) => {}
        }
    })
}

pub fn walk_compound_statement<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &CompoundStatement<'a>,
) -> VisitResult {
    walk_node!(
        visitor,
        node,
        visit_compound_statement,
        leave_compound_statement,
        {
            match node {
                CompoundStatement::FunctionDef(def) => walk_child!(walk_function_def(visitor, def)),
                CompoundStatement::ClassDef(def) => walk_child!(walk_class_def(visitor, def)),
                CompoundStatement::Block(block) => walk_child!(walk_block(visitor, block)),
            }
        }
    )
}

// ============================================================================
// Compound statements
// ============================================================================

pub fn walk_function_def<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &FunctionDef<'a>,
) -> VisitResult {
    walk_node!(visitor, node, visit_function_def, leave_function_def, {
        for decorator in &node.decorators {
            walk_child!(walk_decorator(visitor, decorator));
        }
        walk_child!(walk_name(visitor, &node.name));
        walk_child!(walk_parameters(visitor, &node.params));
        if let Some(returns) = &node.returns {
            walk_child!(walk_annotation(visitor, returns));
        }
        walk_child!(walk_suite(visitor, &node.body));
    })
}

pub fn walk_class_def<'a, V: Visitor<'a>>(visitor: &mut V, node: &ClassDef<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_class_def, leave_class_def, {
        for decorator in &node.decorators {
            walk_child!(walk_decorator(visitor, decorator));
        }
        walk_child!(walk_name(visitor, &node.name));
        walk_child!(walk_suite(visitor, &node.body));
    })
}

pub fn walk_block<'a, V: Visitor<'a>>(visitor: &mut V, node: &Block<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_block, leave_block, {
        for suite in &node.bodies {
            walk_child!(walk_suite(visitor, suite));
        }
    })
}

pub fn walk_decorator<'a, V: Visitor<'a>>(visitor: &mut V, node: &Decorator<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_decorator, leave_decorator, {
        walk_child!(walk_expression(visitor, &node.expression));
    })
}

pub fn walk_suite<'a, V: Visitor<'a>>(visitor: &mut V, node: &Suite<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_suite, leave_suite, {
        match node {
            Suite::IndentedBlock(block) => walk_child!(walk_indented_block(visitor, block)),
            Suite::SimpleStatementSuite(suite) => {
                walk_child!(walk_simple_statement_suite(visitor, suite))
            }
        }
    })
}

pub fn walk_indented_block<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &IndentedBlock<'a>,
) -> VisitResult {
    walk_node!(visitor, node, visit_indented_block, leave_indented_block, {
        for statement in &node.body {
            walk_child!(walk_statement(visitor, statement));
        }
    })
}

pub fn walk_simple_statement_suite<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &SimpleStatementSuite<'a>,
) -> VisitResult {
    walk_node!(
        visitor,
        node,
        visit_simple_statement_suite,
        leave_simple_statement_suite,
        {
            for small in &node.body {
                walk_child!(walk_small_statement(visitor, small));
            }
        }
    )
}

// ============================================================================
// Simple statements
// ============================================================================

pub fn walk_import<'a, V: Visitor<'a>>(visitor: &mut V, node: &Import<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_import_stmt, leave_import_stmt, {
        for alias in &node.names {
            walk_child!(walk_import_alias(visitor, alias));
        }
    })
}

pub fn walk_import_from<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &ImportFrom<'a>,
) -> VisitResult {
    walk_node!(visitor, node, visit_import_from, leave_import_from, {
        if let ImportNames::Aliases(aliases) = &node.names {
            for alias in aliases {
                walk_child!(walk_import_alias(visitor, alias));
            }
        }
    })
}

pub fn walk_import_alias<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &ImportAlias<'a>,
) -> VisitResult {
    walk_node!(visitor, node, visit_import_alias, leave_import_alias, {})
}

pub fn walk_ann_assign<'a, V: Visitor<'a>>(visitor: &mut V, node: &AnnAssign<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_ann_assign, leave_ann_assign, {
        walk_child!(walk_expression(visitor, &node.target));
        walk_child!(walk_annotation(visitor, &node.annotation));
        if let Some(value) = &node.value {
            walk_child!(walk_expression(visitor, value));
        }
    })
}

pub fn walk_expr<'a, V: Visitor<'a>>(visitor: &mut V, node: &Expr<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_expr, leave_expr, {
        walk_child!(walk_expression(visitor, &node.value));
    })
}

// ============================================================================
// Parameters and expressions
// ============================================================================

pub fn walk_parameters<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &Parameters<'a>,
) -> VisitResult {
    walk_node!(visitor, node, visit_parameters, leave_parameters, {
        for param in node.all_params() {
            walk_child!(walk_param(visitor, param));
        }
    })
}

pub fn walk_param<'a, V: Visitor<'a>>(visitor: &mut V, node: &Param<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_param, leave_param, {
        walk_child!(walk_name(visitor, &node.name));
        if let Some(annotation) = &node.annotation {
            walk_child!(walk_annotation(visitor, annotation));
        }
        if let Some(default) = &node.default {
            walk_child!(walk_expression(visitor, default));
        }
    })
}

pub fn walk_annotation<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &Annotation<'a>,
) -> VisitResult {
    walk_node!(visitor, node, visit_annotation, leave_annotation, {})
}

pub fn walk_expression<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &Expression<'a>,
) -> VisitResult {
    walk_node!(visitor, node, visit_expression, leave_expression, {
        match node {
            Expression::Name(name) => walk_child!(walk_name(visitor, name)),
            Expression::SimpleString(string) => walk_child!(walk_simple_string(visitor, string)),
            Expression::FormattedString(_)
            | Expression::ConcatenatedString(_)
            | Expression::Other(_) => {}
        }
    })
}

pub fn walk_simple_string<'a, V: Visitor<'a>>(
    visitor: &mut V,
    node: &SimpleString<'a>,
) -> VisitResult {
    walk_node!(visitor, node, visit_simple_string, leave_simple_string, {})
}

pub fn walk_name<'a, V: Visitor<'a>>(visitor: &mut V, node: &Name<'a>) -> VisitResult {
    walk_node!(visitor, node, visit_name, leave_name, {})
}

// ============================================================================
// Transformation
// ============================================================================

/// Walk `module` with `transformer` and apply the edits it recorded.
///
/// Returns the rewritten source. A transformer that recorded nothing yields
/// the module's source unchanged.
pub fn transform_module<'a, T: Transformer<'a>>(
    transformer: &mut T,
    module: &Module<'a>,
) -> BatchEditResult<String> {
    walk_module(transformer, module);
    let options = BatchEditOptions {
        allow_empty: true,
        ..BatchEditOptions::default()
    };
    let mut editor = BatchSpanEditor::with_options(module.code(), options);
    editor.add_all(transformer.take_edits());
    editor.apply()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_module;
    use crate::visitor::EditPrimitive;

    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
        stop_at: Option<&'static str>,
        skip_class_bodies: bool,
    }

    impl<'a> Visitor<'a> for EventLog {
        fn visit_function_def(&mut self, node: &FunctionDef<'a>) -> VisitResult {
            self.events.push(format!("def {}", node.name.value));
            if self.stop_at == Some(node.name.value) {
                return VisitResult::Stop;
            }
            VisitResult::Continue
        }

        fn leave_function_def(&mut self, node: &FunctionDef<'a>) {
            self.events.push(format!("/def {}", node.name.value));
        }

        fn visit_class_def(&mut self, node: &ClassDef<'a>) -> VisitResult {
            self.events.push(format!("class {}", node.name.value));
            if self.skip_class_bodies {
                VisitResult::SkipChildren
            } else {
                VisitResult::Continue
            }
        }

        fn leave_class_def(&mut self, node: &ClassDef<'a>) {
            self.events.push(format!("/class {}", node.name.value));
        }

        fn visit_param(&mut self, node: &Param<'a>) -> VisitResult {
            self.events.push(format!("param {}", node.name.value));
            VisitResult::Continue
        }
    }

    const SOURCE: &str = "class A:\n    def f(self, x):\n        pass\n\ndef g(*args, y, **kw):\n    pass\n";

    #[test]
    fn test_walk_pre_and_post_order() {
        let module = parse_module(SOURCE).unwrap();
        let mut log = EventLog::default();
        assert_eq!(walk_module(&mut log, &module), VisitResult::Continue);
        assert_eq!(
            log.events,
            vec![
                "class A",
                "def f",
                "param self",
                "param x",
                "/def f",
                "/class A",
                "def g",
                "param args",
                "param y",
                "param kw",
                "/def g",
            ]
        );
    }

    #[test]
    fn test_walk_skip_children_still_leaves() {
        let module = parse_module(SOURCE).unwrap();
        let mut log = EventLog {
            skip_class_bodies: true,
            ..EventLog::default()
        };
        walk_module(&mut log, &module);
        assert_eq!(&log.events[..3], &["class A", "/class A", "def g"]);
    }

    #[test]
    fn test_walk_stop_halts_everything() {
        let module = parse_module(SOURCE).unwrap();
        let mut log = EventLog {
            stop_at: Some("f"),
            ..EventLog::default()
        };
        assert_eq!(walk_module(&mut log, &module), VisitResult::Stop);
        assert_eq!(log.events, vec!["class A", "def f"]);
    }

    struct NoopTransformer;

    impl<'a> Visitor<'a> for NoopTransformer {}

    impl<'a> Transformer<'a> for NoopTransformer {
        fn take_edits(&mut self) -> Vec<EditPrimitive> {
            Vec::new()
        }
    }

    #[test]
    fn test_transform_without_edits_is_identity() {
        let module = parse_module(SOURCE).unwrap();
        let out = transform_module(&mut NoopTransformer, &module).unwrap();
        assert_eq!(out, SOURCE);
    }
}
