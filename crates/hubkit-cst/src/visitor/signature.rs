// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Collectors for callable signatures.
//!
//! - [`ArgumentsCollector`]: parameter names already declared by a function
//! - [`ClassMethodCollector`]: method names defined by a class

use std::collections::BTreeSet;

use tracing::warn;

use super::dispatch::walk_module;
use super::traits::{VisitResult, Visitor};
use crate::nodes::{ClassDef, CompoundStatement, FunctionDef, Module, Statement, Suite};

/// Collects the parameter names of every function named `method_name`, at
/// any depth, excluding `self`.
///
/// Positional-only, regular, keyword-only and star parameters all count, the
/// same set [`AddParametersTransformer`](super::AddParametersTransformer)
/// checks before adding a field.
///
/// Several definitions with the same name (overloads, for instance) are
/// unioned; [`ArgumentsCollector::matches`] tells how many were seen.
pub struct ArgumentsCollector {
    method_name: String,
    arguments: BTreeSet<String>,
    matches: usize,
}

impl ArgumentsCollector {
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            arguments: BTreeSet::new(),
            matches: 0,
        }
    }

    /// Collect the existing argument names of `method_name`.
    pub fn collect(module: &Module<'_>, method_name: &str) -> BTreeSet<String> {
        let mut collector = ArgumentsCollector::new(method_name);
        walk_module(&mut collector, module);
        if collector.matches > 1 {
            warn!(
                method = method_name,
                definitions = collector.matches,
                "several definitions found, using the union of their parameters"
            );
        }
        collector.arguments
    }

    /// Number of definitions that matched.
    pub fn matches(&self) -> usize {
        self.matches
    }

    pub fn arguments(&self) -> &BTreeSet<String> {
        &self.arguments
    }

    pub fn into_arguments(self) -> BTreeSet<String> {
        self.arguments
    }
}

impl<'a> Visitor<'a> for ArgumentsCollector {
    fn visit_function_def(&mut self, node: &FunctionDef<'a>) -> VisitResult {
        if node.name.value == self.method_name {
            self.matches += 1;
            self.arguments
                .extend(node.params.declared_names().map(str::to_string));
        }
        VisitResult::Continue
    }
}

/// Lists the methods defined directly in the body of a module-level class.
///
/// Names keep definition order; a name defined twice (overloads, property
/// setters) is listed once.
pub struct ClassMethodCollector {
    class_name: String,
    methods: Vec<String>,
}

impl ClassMethodCollector {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            methods: Vec::new(),
        }
    }

    pub fn collect(module: &Module<'_>, class_name: &str) -> Vec<String> {
        let mut collector = ClassMethodCollector::new(class_name);
        walk_module(&mut collector, module);
        collector.methods
    }

    pub fn into_methods(self) -> Vec<String> {
        self.methods
    }
}

impl<'a> Visitor<'a> for ClassMethodCollector {
    fn visit_class_def(&mut self, node: &ClassDef<'a>) -> VisitResult {
        if node.name.value != self.class_name {
            return VisitResult::SkipChildren;
        }
        let Suite::IndentedBlock(block) = &node.body else {
            return VisitResult::SkipChildren;
        };
        for statement in &block.body {
            if let Statement::Compound(CompoundStatement::FunctionDef(def)) = statement {
                if !self.methods.iter().any(|m| m == def.name.value) {
                    self.methods.push(def.name.value.to_string());
                }
            }
        }
        VisitResult::Stop
    }

    fn visit_function_def(&mut self, _node: &FunctionDef<'a>) -> VisitResult {
        VisitResult::SkipChildren
    }
}
