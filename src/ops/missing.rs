//! Parameters declared for a task but absent from its client method.

use std::collections::BTreeSet;

use hubkit_cst::{ArgumentsCollector, DataclassFieldCollector, FieldInfo, Module};

/// Declared fields missing from a method, in declaration order.
pub type MissingParameters = Vec<FieldInfo>;

/// Fields whose names are not in `existing`.
pub fn find_missing_parameters(fields: &[FieldInfo], existing: &BTreeSet<String>) -> MissingParameters {
    fields
        .iter()
        .filter(|field| !existing.contains(&field.name))
        .cloned()
        .collect()
}

/// Compare the `parameters_type` record in `declarations` with the
/// arguments of every `method_name` definition in `client`.
pub fn check_missing_parameters(
    client: &Module<'_>,
    declarations: &Module<'_>,
    method_name: &str,
    parameters_type: &str,
) -> MissingParameters {
    let fields = DataclassFieldCollector::collect(declarations, parameters_type);
    let existing = ArgumentsCollector::collect(client, method_name);
    find_missing_parameters(&fields, &existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubkit_cst::parse_module;

    fn field(name: &str) -> FieldInfo {
        FieldInfo {
            name: name.to_string(),
            annotation: "Optional[int]".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_order_is_preserved() {
        let fields = vec![field("top_k"), field("model"), field("threshold")];
        let existing = BTreeSet::from(["model".to_string()]);
        let names: Vec<String> = find_missing_parameters(&fields, &existing)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["top_k", "threshold"]);
    }

    #[test]
    fn test_check_missing_parameters() {
        let declarations = parse_module(
            "@dataclass\nclass FillMaskParameters(BaseInferenceType):\n    targets: Optional[List[str]] = None\n    top_k: Optional[int] = None\n",
        )
        .unwrap();
        let client = parse_module(
            "class InferenceClient:\n    def fill_mask(self, text: str, *, model: Optional[str] = None, top_k: Optional[int] = None):\n        pass\n",
        )
        .unwrap();
        let missing = check_missing_parameters(&client, &declarations, "fill_mask", "FillMaskParameters");
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "targets");
        assert_eq!(missing[0].annotation, "Optional[List[str]]");

        // No such method: every field is missing.
        let missing = check_missing_parameters(&client, &declarations, "translation", "FillMaskParameters");
        assert_eq!(missing.len(), 2);

        // No such record: nothing to add.
        assert!(check_missing_parameters(&client, &declarations, "fill_mask", "Nope").is_empty());
    }
}
