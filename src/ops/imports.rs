//! Imports needed by newly added parameter annotations.

use std::collections::{BTreeMap, BTreeSet};

use hubkit_cst::annotation::extract_type_names;
use hubkit_cst::visitor::imported_objects;
use hubkit_cst::{FieldInfo, Module, ModulesCollector};
use serde::Serialize;

/// Names to import, grouped by module.
///
/// Modules iterate in sorted order. Names keep the order they were first
/// added in and appear once per module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImportPlan {
    modules: BTreeMap<String, Vec<String>>,
}

impl ImportPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.values().all(Vec::is_empty)
    }

    /// Add `name` under `module` unless already present.
    pub fn insert(&mut self, module: &str, name: &str) {
        let names = self.modules.entry(module.to_string()).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    /// Union `other` into this plan.
    pub fn merge(&mut self, other: &ImportPlan) {
        for (module, names) in &other.modules {
            for name in names {
                self.insert(module, name);
            }
        }
    }

    pub fn names(&self, module: &str) -> &[String] {
        self.modules.get(module).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One `from <module> import a, b` line per module with names.
    pub fn render_lines(&self) -> Vec<String> {
        self.modules
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(module, names)| format!("from {module} import {}", names.join(", ")))
            .collect()
    }
}

/// Where declaration types come from and what the client already imports.
pub struct ImportContext<'m, 'a> {
    /// Module holding the parameters record.
    pub declarations: &'m Module<'a>,
    /// Origin of declared types, and the package for relative imports in
    /// `declarations`.
    pub declarations_module: &'m str,
    /// The client being rewritten.
    pub client: &'m Module<'a>,
    /// Package for relative imports in `client`.
    pub client_package: &'m str,
}

/// Plan the imports the annotations of `fields` require.
///
/// Each type name is attributed to the module the declarations file gets it
/// from, or to the declarations module when it is defined locally or not
/// found. Names the client already imports from that module are left out.
pub fn plan_imports(fields: &[FieldInfo], ctx: &ImportContext<'_, '_>) -> ImportPlan {
    let required: BTreeSet<String> = fields
        .iter()
        .flat_map(|field| extract_type_names(&field.annotation))
        .collect();

    let existing = imported_objects(ctx.client, ctx.client_package);
    let origins = ModulesCollector::collect(
        ctx.declarations,
        ctx.declarations_module,
        ctx.declarations_module,
    );

    let mut plan = ImportPlan::new();
    for name in &required {
        let module = origins
            .get(name)
            .map(String::as_str)
            .unwrap_or(ctx.declarations_module);
        let imported = existing
            .get(module)
            .is_some_and(|names| names.contains(name));
        if !imported {
            plan.insert(module, name);
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubkit_cst::parse_module;

    fn field(name: &str, annotation: &str) -> FieldInfo {
        FieldInfo {
            name: name.to_string(),
            annotation: annotation.to_string(),
            description: String::new(),
        }
    }

    const DECLARATIONS: &str = r#"from typing import List, Optional

from .base import BaseInferenceType, dataclass_with_extra
from .chat_completion import ChatCompletionModel


@dataclass_with_extra
class FillMaskParameters(BaseInferenceType):
    model: Optional["ChatCompletionModel"] = None
    targets: Optional[List[str]] = None
"#;

    fn plan_for(client_source: &str, fields: &[FieldInfo]) -> ImportPlan {
        let declarations = parse_module(DECLARATIONS).unwrap();
        let client = parse_module(client_source).unwrap();
        let ctx = ImportContext {
            declarations: &declarations,
            declarations_module: "pkg.types",
            client: &client,
            client_package: "pkg",
        };
        plan_imports(fields, &ctx)
    }

    #[test]
    fn test_builtin_annotations_need_nothing() {
        let plan = plan_for("import os\n", &[field("top_k", "Optional[int]"), field("targets", "Optional[List[str]]")]);
        assert!(plan.is_empty());
        assert!(plan.render_lines().is_empty());
    }

    #[test]
    fn test_imported_type_resolves_to_source_module() {
        let plan = plan_for("import os\n", &[field("model", "Optional[\"ChatCompletionModel\"]")]);
        assert_eq!(
            plan.render_lines(),
            vec!["from pkg.types.chat_completion import ChatCompletionModel"]
        );
    }

    #[test]
    fn test_type_declared_in_declarations_module() {
        let declarations = parse_module(
            "@dataclass\nclass ChatCompletionModel(BaseInferenceType):\n    name: str\n",
        )
        .unwrap();
        let fields = [field("model", "Optional[\"ChatCompletionModel\"]")];
        let plan_with = |client_source: &str| {
            let client = parse_module(client_source).unwrap();
            let ctx = ImportContext {
                declarations: &declarations,
                declarations_module: "pkg.types",
                client: &client,
                client_package: "pkg",
            };
            plan_imports(&fields, &ctx)
        };

        assert_eq!(
            plan_with("import os\n").render_lines(),
            vec!["from pkg.types import ChatCompletionModel"]
        );
        assert!(plan_with("from pkg.types import ChatCompletionModel\n").is_empty());
    }

    #[test]
    fn test_existing_import_suppresses_plan() {
        let client = "from pkg.types.chat_completion import ChatCompletionModel as Model\n";
        let plan = plan_for(client, &[field("model", "Optional[\"ChatCompletionModel\"]")]);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_unknown_and_local_names_default_to_declarations_module() {
        let plan = plan_for(
            "from .other import Unrelated\n",
            &[field("a", "Optional[LocalAlias]"), field("b", "Union[Zeta, Alpha]")],
        );
        assert_eq!(plan.names("pkg.types"), ["Alpha", "LocalAlias", "Zeta"]);
        assert_eq!(
            plan.render_lines(),
            vec!["from pkg.types import Alpha, LocalAlias, Zeta"]
        );
    }

    #[test]
    fn test_relative_client_import_counts_as_existing() {
        let plan = plan_for("from .types import LocalAlias\n", &[field("a", "Optional[LocalAlias]")]);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let mut first = ImportPlan::new();
        first.insert("pkg.types", "B");
        first.insert("pkg.types", "A");
        let mut second = ImportPlan::new();
        second.insert("pkg.types", "A");
        second.insert("pkg.types", "C");
        second.insert("pkg.other", "D");

        first.merge(&second);
        assert_eq!(
            first.render_lines(),
            vec!["from pkg.other import D", "from pkg.types import B, A, C"]
        );
    }

    #[test]
    fn test_plan_serializes_as_map() {
        let mut plan = ImportPlan::new();
        plan.insert("pkg.types", "A");
        assert_eq!(
            serde_json::to_string(&plan).unwrap(),
            r#"{"pkg.types":["A"]}"#
        );
    }
}
