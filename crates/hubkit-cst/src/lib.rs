// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A lossless Python source parser with span-based rewriting.
//!
//! The parser builds a syntax tree covering the statement structure that
//! source-to-source tooling needs: imports, annotated assignments, string
//! literal statements, function and class definitions with full parameter
//! lists, and every block statement. Expressions are kept as source slices.
//! Every node carries a byte [`Span`] into the original text.
//!
//! Rewriting never regenerates code from the tree. Visitors record
//! [`EditPrimitive`](visitor::EditPrimitive)s against spans and the batch
//! editor splices them into the original text, so everything outside an
//! edit is preserved byte for byte.
//!
//! # Quick Start
//!
//! ```
//! use hubkit_cst::parse_module;
//! use hubkit_cst::visitor::ArgumentsCollector;
//!
//! let source = "def hello(self, name: str, *, loud: bool = False): ...\n";
//! let module = parse_module(source).unwrap();
//! assert_eq!(module.code(), source);
//!
//! let args = ArgumentsCollector::collect(&module, "hello");
//! assert_eq!(args.into_iter().collect::<Vec<_>>(), vec!["loud", "name"]);
//! ```

pub mod annotation;
pub mod nodes;
pub mod parser;
pub mod tokenizer;

/// Visitor and transformer infrastructure for tree traversal.
pub mod visitor;

pub use nodes::*;
pub use parser::{parse_module, ParserError};
pub use tokenizer::TokError;
pub use visitor::{
    transform_module, walk_module, AddImportsTransformer, AddParametersTransformer,
    ArgumentsCollector, ClassMethodCollector, DataclassFieldCollector, FieldInfo, ImportCollector,
    ModulesCollector, Transformer, VisitResult, Visitor,
};
