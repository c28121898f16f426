// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Maps type names to the module that defines them.
//!
//! Run over a package's `__init__` module, [`ModulesCollector`] tells where
//! every re-exported type actually lives, so that generated imports point at
//! the defining module.

use std::collections::BTreeMap;

use super::dispatch::walk_module;
use super::import::resolve_module;
use super::traits::{VisitResult, Visitor};
use crate::nodes::{ClassDef, FunctionDef, ImportFrom, ImportNames, Module};

/// Builds a `type name -> module` map.
///
/// - Top-level classes map to `default_module`.
/// - `from X import A` maps `A` to `X`, with relative imports resolved
///   against `package`.
///
/// Entries are recorded in source order; a later entry for the same name
/// overwrites an earlier one.
pub struct ModulesCollector {
    default_module: String,
    package: String,
    type_to_module: BTreeMap<String, String>,
}

impl ModulesCollector {
    pub fn new(default_module: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            default_module: default_module.into(),
            package: package.into(),
            type_to_module: BTreeMap::new(),
        }
    }

    /// Collect the map for a module whose own classes belong to
    /// `default_module` and whose relative imports resolve against `package`.
    pub fn collect(
        module: &Module<'_>,
        default_module: &str,
        package: &str,
    ) -> BTreeMap<String, String> {
        let mut collector = ModulesCollector::new(default_module, package);
        walk_module(&mut collector, module);
        collector.type_to_module
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.type_to_module
    }
}

impl<'a> Visitor<'a> for ModulesCollector {
    fn visit_class_def(&mut self, node: &ClassDef<'a>) -> VisitResult {
        self.type_to_module
            .insert(node.name.value.to_string(), self.default_module.clone());
        VisitResult::SkipChildren
    }

    fn visit_function_def(&mut self, _node: &FunctionDef<'a>) -> VisitResult {
        VisitResult::SkipChildren
    }

    fn visit_import_from(&mut self, node: &ImportFrom<'a>) -> VisitResult {
        let ImportNames::Aliases(aliases) = &node.names else {
            return VisitResult::SkipChildren;
        };
        let written = node.module.as_ref().map(|m| m.value()).unwrap_or_default();
        let module = resolve_module(&self.package, node.relative, &written);
        for alias in aliases {
            self.type_to_module.insert(alias.name.value(), module.clone());
        }
        VisitResult::SkipChildren
    }
}
