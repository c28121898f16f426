// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor and transformer infrastructure for syntax tree traversal.
//!
//! # Traversal Order
//!
//! - **Depth-first, pre-order** for `visit_*` methods
//! - **Post-order** for `leave_*` methods
//! - Children are visited in source order (left-to-right, top-to-bottom)
//!
//! # Collectors
//!
//! Read-only visitors gather facts from a tree and are consumed through a
//! `collect` associated function:
//!
//! - [`DataclassFieldCollector`]: annotated fields of a record class
//! - [`ArgumentsCollector`], [`ClassMethodCollector`]: callable signatures
//! - [`ImportCollector`]: import statements
//! - [`ModulesCollector`]: where each type name is defined
//!
//! # Transformers
//!
//! A [`Transformer`] records span edits while it walks; [`transform_module`]
//! applies them to the module source in one batch:
//!
//! - [`AddParametersTransformer`]: new keyword-only parameters plus docstring
//!   entries
//! - [`AddImportsTransformer`]: import lines after the leading import block

// Traversal
mod batch_edit;
mod dispatch;
mod traits;

// Collectors
mod dataclass;
mod import;
mod modules;
mod signature;

// Transformers
mod add_imports;
mod add_parameters;

pub use batch_edit::{
    detect_indentation, BatchEditError, BatchEditOptions, BatchEditResult, BatchSpanEditor,
    EditPrimitive,
};
pub use dispatch::*;
pub use traits::{Transformer, VisitResult, Visitor};

pub use dataclass::{DataclassFieldCollector, FieldInfo};
pub use import::{imported_objects, resolve_module, ImportCollector, ImportInfo, ImportKind, ImportedName};
pub use modules::ModulesCollector;
pub use signature::{ArgumentsCollector, ClassMethodCollector};

pub use add_imports::AddImportsTransformer;
pub use add_parameters::AddParametersTransformer;
