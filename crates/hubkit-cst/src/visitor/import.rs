// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! ImportCollector visitor for import statement extraction.
//!
//! Collects every import statement of a module, at any depth, with its
//! module path, imported names and aliases.
//!
//! - **import statements**: `import os`, `import os.path as p`
//! - **from imports**: `from typing import List`, `from x import y as z`
//! - **star imports**: `from os import *`
//! - **relative imports**: `from . import foo`, `from ..utils import bar`
//!
//! [`imported_objects`] condenses the `from` imports into the set of names
//! already imported from each absolute module, which is what import
//! synthesis needs to avoid duplicates.
//!
//! # Usage
//!
//! ```
//! use hubkit_cst::parse_module;
//! use hubkit_cst::visitor::{ImportCollector, ImportKind};
//!
//! let module = parse_module("import os\nfrom sys import path\n").unwrap();
//! let imports = ImportCollector::collect(&module);
//! assert_eq!(imports[1].kind, ImportKind::From);
//! assert_eq!(imports[1].module, "sys");
//! ```

use std::collections::{BTreeMap, BTreeSet};

use super::dispatch::walk_module;
use super::traits::{VisitResult, Visitor};
use crate::nodes::{Import, ImportFrom, ImportNames, Module};
use hubkit_core::patch::Span;

/// The kind of import statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// Regular import (`import os`).
    Import,
    /// From import (`from os import path`).
    From,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Import => "import",
            ImportKind::From => "from",
        }
    }
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single imported name within a `from` import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    pub name: String,
    /// The alias if using `as` clause.
    pub alias: Option<String>,
}

/// One import target.
///
/// `import a, b` yields two infos; a `from` import yields one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    pub kind: ImportKind,
    /// The module path as written, without leading dots.
    pub module: String,
    /// Alias for the whole module (for `import x as y`).
    pub alias: Option<String>,
    /// Names imported by a `from` import; empty for star imports.
    pub names: Vec<ImportedName>,
    pub is_star: bool,
    /// Number of leading dots for relative imports.
    pub relative_level: usize,
    /// Span of the whole import statement.
    pub span: Span,
}

impl ImportInfo {
    /// The absolute module path, resolving relative imports against
    /// `package`.
    pub fn absolute_module(&self, package: &str) -> String {
        resolve_module(package, self.relative_level, &self.module)
    }
}

/// A visitor that collects import information.
#[derive(Default)]
pub struct ImportCollector {
    imports: Vec<ImportInfo>,
}

impl ImportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect imports in the order they appear.
    pub fn collect(module: &Module<'_>) -> Vec<ImportInfo> {
        let mut collector = ImportCollector::new();
        walk_module(&mut collector, module);
        collector.imports
    }

    pub fn into_imports(self) -> Vec<ImportInfo> {
        self.imports
    }
}

impl<'a> Visitor<'a> for ImportCollector {
    fn visit_import_stmt(&mut self, node: &Import<'a>) -> VisitResult {
        for alias in &node.names {
            self.imports.push(ImportInfo {
                kind: ImportKind::Import,
                module: alias.name.value(),
                alias: alias.asname.map(|n| n.value.to_string()),
                names: Vec::new(),
                is_star: false,
                relative_level: 0,
                span: node.span,
            });
        }
        VisitResult::SkipChildren
    }

    fn visit_import_from(&mut self, node: &ImportFrom<'a>) -> VisitResult {
        let module = node.module.as_ref().map(|m| m.value()).unwrap_or_default();
        let (names, is_star) = match &node.names {
            ImportNames::Star(_) => (Vec::new(), true),
            ImportNames::Aliases(aliases) => (
                aliases
                    .iter()
                    .map(|a| ImportedName {
                        name: a.name.value(),
                        alias: a.asname.map(|n| n.value.to_string()),
                    })
                    .collect(),
                false,
            ),
        };
        self.imports.push(ImportInfo {
            kind: ImportKind::From,
            module,
            alias: None,
            names,
            is_star,
            relative_level: node.relative,
            span: node.span,
        });
        VisitResult::SkipChildren
    }
}

/// Resolve a possibly relative module reference.
///
/// `package` is the package containing the importing module. One dot refers
/// to `package` itself, each further dot to its parent.
///
/// ```
/// use hubkit_cst::visitor::resolve_module;
///
/// assert_eq!(resolve_module("pkg.types", 0, "typing"), "typing");
/// assert_eq!(resolve_module("pkg.types", 1, "base"), "pkg.types.base");
/// assert_eq!(resolve_module("pkg.types", 2, "utils"), "pkg.utils");
/// assert_eq!(resolve_module("pkg.types", 1, ""), "pkg.types");
/// ```
pub fn resolve_module(package: &str, level: usize, module: &str) -> String {
    if level == 0 {
        return module.to_string();
    }
    let mut parts: Vec<&str> = package.split('.').filter(|p| !p.is_empty()).collect();
    parts.truncate(parts.len().saturating_sub(level - 1));
    if !module.is_empty() {
        parts.push(module);
    }
    parts.join(".")
}

/// Names already imported from each module by `from` imports.
///
/// Keys are absolute module paths; relative imports are resolved against
/// `package`. Values are the imported (not aliased) names. Star imports are
/// ignored.
pub fn imported_objects(module: &Module<'_>, package: &str) -> BTreeMap<String, BTreeSet<String>> {
    let mut objects: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for import in ImportCollector::collect(module) {
        if import.kind != ImportKind::From || import.is_star {
            continue;
        }
        objects
            .entry(import.absolute_module(package))
            .or_default()
            .extend(import.names.into_iter().map(|n| n.name));
    }
    objects
}
