// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor and transformer trait definitions for syntax tree traversal.

use super::batch_edit::EditPrimitive;
use crate::nodes::{
    // Module
    Module,
    // Statements
    Statement, CompoundStatement, SimpleStatementLine, SimpleStatementSuite, SmallStatement,
    Suite, IndentedBlock,
    // Compound statements
    FunctionDef, ClassDef, Block, Decorator,
    // Simple statements
    Import, ImportFrom, ImportAlias, AnnAssign, Expr,
    // Parameters and expressions
    Parameters, Param, Annotation, Expression, SimpleString, Name,
};

/// Result of visiting a node - controls traversal behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitResult {
    /// Continue traversal into children.
    ///
    /// After visiting children, `leave_*` will be called for this node.
    #[default]
    Continue,

    /// Skip children, continue with siblings.
    ///
    /// `leave_*` is still called for this node.
    SkipChildren,

    /// Stop traversal entirely.
    ///
    /// No further `visit_*` or `leave_*` methods will be called.
    Stop,
}

/// Generates `visit_*` / `leave_*` method pairs with default implementations.
///
/// ```ignore
/// visitor_methods! {
///     // Generates visit_name and leave_name for Name<'a>
///     name: Name<'a>,
/// }
/// ```
macro_rules! visitor_methods {
    (
        $(
            $(#[$meta:meta])*
            $base_name:ident : $node_type:ty
        ),* $(,)?
    ) => {
        paste::paste! {
            $(
                $(#[$meta])*
                #[doc = concat!("Visit a [`", stringify!($node_type), "`] node.")]
                #[doc = ""]
                #[doc = "Called before descending into children."]
                #[allow(unused_variables)]
                fn [<visit_ $base_name>](&mut self, node: &$node_type) -> VisitResult {
                    VisitResult::Continue
                }

                $(#[$meta])*
                #[doc = concat!("Leave a [`", stringify!($node_type), "`] node.")]
                #[doc = ""]
                #[doc = "Called after children, even if `SkipChildren` was returned."]
                #[allow(unused_variables)]
                fn [<leave_ $base_name>](&mut self, node: &$node_type) {}
            )*
        }
    };
}

/// Immutable visitor for syntax tree traversal.
///
/// - `visit_*` is called in **pre-order** (before children)
/// - `leave_*` is called in **post-order** (after children)
/// - Children are visited in source order
///
/// # Example
///
/// ```
/// use hubkit_cst::visitor::{walk_module, VisitResult, Visitor};
/// use hubkit_cst::{parse_module, FunctionDef};
///
/// struct DefCounter {
///     count: usize,
/// }
///
/// impl<'a> Visitor<'a> for DefCounter {
///     fn visit_function_def(&mut self, _node: &FunctionDef<'a>) -> VisitResult {
///         self.count += 1;
///         VisitResult::Continue
///     }
/// }
///
/// let module = parse_module("def a(): pass\nclass C:\n    def b(self): pass\n").unwrap();
/// let mut counter = DefCounter { count: 0 };
/// walk_module(&mut counter, &module);
/// assert_eq!(counter.count, 2);
/// ```
pub trait Visitor<'a> {
    // Module
    visitor_methods! {
        module: Module<'a>,
    }

    // Statements
    visitor_methods! {
        statement: Statement<'a>,
        compound_statement: CompoundStatement<'a>,
        simple_statement_line: SimpleStatementLine<'a>,
        simple_statement_suite: SimpleStatementSuite<'a>,
        small_statement: SmallStatement<'a>,
        suite: Suite<'a>,
        indented_block: IndentedBlock<'a>,
    }

    // Compound statements
    visitor_methods! {
        function_def: FunctionDef<'a>,
        class_def: ClassDef<'a>,
        block: Block<'a>,
        decorator: Decorator<'a>,
    }

    // Simple statements
    visitor_methods! {
        import_stmt: Import<'a>,
        import_from: ImportFrom<'a>,
        import_alias: ImportAlias<'a>,
        ann_assign: AnnAssign<'a>,
        expr: Expr<'a>,
    }

    // Parameters and expressions
    visitor_methods! {
        parameters: Parameters<'a>,
        param: Param<'a>,
        annotation: Annotation<'a>,
        expression: Expression<'a>,
        simple_string: SimpleString<'a>,
        name: Name<'a>,
    }
}

/// A visitor that rewrites the source it walks.
///
/// Transformers never mutate the tree. They record [`EditPrimitive`]s against
/// node spans while visiting, and
/// [`transform_module`](super::dispatch::transform_module) applies the
/// accumulated edits to the module's source in one batch.
pub trait Transformer<'a>: Visitor<'a> {
    /// Drain the edits recorded so far.
    fn take_edits(&mut self) -> Vec<EditPrimitive>;
}
