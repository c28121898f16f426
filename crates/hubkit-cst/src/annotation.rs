// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Type names referenced by an annotation.
//!
//! Annotations are handled as text: the only question asked of them is which
//! names would have to be imported for the annotation to resolve.
//!
//! ```
//! use hubkit_cst::annotation::{extract_type_names, strip_optional};
//!
//! let names = extract_type_names("Optional[List[\"ChatMessage\"]]");
//! assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["ChatMessage"]);
//!
//! assert_eq!(strip_optional("Optional[int]"), ("int", true));
//! ```

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static TYPE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\w+|'[^']+'|"[^"]+""#).unwrap());

/// Builtin types and `typing` forms that never need an import.
const BUILTIN_NAMES: &[&str] = &[
    // builtins
    "bool", "bytearray", "bytes", "complex", "dict", "float", "frozenset", "int", "list",
    "memoryview", "object", "range", "set", "slice", "str", "tuple", "type",
    "BaseException", "Exception", "None", "NoneType", "Ellipsis",
    // typing
    "typing", "Any", "AsyncGenerator", "AsyncIterable", "AsyncIterator", "Annotated",
    "Awaitable", "BinaryIO", "Callable", "ClassVar", "Coroutine", "Dict", "Final", "FrozenSet",
    "Generator", "IO", "Iterable", "Iterator", "List", "Literal", "Mapping", "MutableMapping",
    "NoReturn", "Optional", "Sequence", "Set", "TextIO", "Tuple", "Type", "Union",
];

/// True if `name` is a builtin type or a `typing` form.
pub fn is_builtin_name(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Names in `annotation` that refer to importable types.
///
/// Quoted forward references are searched recursively. The contents of
/// `Literal[...]` are values, not types, and are ignored.
pub fn extract_type_names(annotation: &str) -> BTreeSet<String> {
    let compact: String = annotation.chars().filter(|c| !c.is_whitespace()).collect();
    let mut names = BTreeSet::new();

    let mut depth = 0usize;
    let mut literal_depth: Option<usize> = None;
    let mut last_end = 0;

    for token in TYPE_TOKEN.find_iter(&compact) {
        for c in compact[last_end..token.start()].chars() {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth = depth.saturating_sub(1);
                    if literal_depth == Some(depth) {
                        literal_depth = None;
                    }
                }
                _ => {}
            }
        }
        last_end = token.end();

        if literal_depth.is_some() {
            continue;
        }

        let text = token.as_str();
        if text.starts_with(['"', '\'']) {
            names.extend(extract_type_names(&text[1..text.len() - 1]));
            continue;
        }
        if text == "Literal" && compact[token.end()..].starts_with('[') {
            literal_depth = Some(depth);
            continue;
        }
        if text.starts_with(|c: char| c.is_ascii_digit()) || is_builtin_name(text) {
            continue;
        }
        names.insert(text.to_string());
    }

    names
}

/// Strip one surrounding `Optional[...]`.
///
/// Returns the inner annotation and whether the wrapper was present.
pub fn strip_optional(annotation: &str) -> (&str, bool) {
    let trimmed = annotation.trim();
    let Some(inner) = trimmed
        .strip_prefix("Optional[")
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return (trimmed, false);
    };

    // `Optional[A] | Optional[B]` starts and ends the right way but the
    // first bracket closes early.
    let mut depth = 0usize;
    for c in inner.chars() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return (trimmed, false),
            ']' => depth -= 1,
            _ => {}
        }
    }
    (inner.trim(), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(annotation: &str) -> Vec<String> {
        extract_type_names(annotation).into_iter().collect()
    }

    #[test]
    fn test_builtins_are_excluded() {
        assert!(names("Optional[str]").is_empty());
        assert!(names("Dict[str, List[int]]").is_empty());
        assert!(names("None").is_empty());
    }

    #[test]
    fn test_plain_and_nested_names() {
        assert_eq!(names("Optional[ChatMessage]"), vec!["ChatMessage"]);
        assert_eq!(
            names("Union[List[TextToImageTargetSize], Dict[str, Any]]"),
            vec!["TextToImageTargetSize"]
        );
    }

    #[test]
    fn test_quoted_forward_references() {
        assert_eq!(
            names("Optional[\"ChatCompletionModel\"]"),
            vec!["ChatCompletionModel"]
        );
        assert_eq!(names("'List[Foo]'"), vec!["Foo"]);
    }

    #[test]
    fn test_literal_values_are_ignored() {
        assert!(names("Literal['never', 'always']").is_empty());
        assert_eq!(
            names("Optional[Union[Literal[\"auto\", \"none\"], ToolChoice]]"),
            vec!["ToolChoice"]
        );
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(
            names("Optional[ List[ GenerationParameters ] ]"),
            vec!["GenerationParameters"]
        );
    }

    #[test]
    fn test_strip_optional() {
        assert_eq!(strip_optional("Optional[int]"), ("int", true));
        assert_eq!(
            strip_optional("Optional[List[\"Tool\"]]"),
            ("List[\"Tool\"]", true)
        );
        assert_eq!(strip_optional("List[int]"), ("List[int]", false));
        assert_eq!(
            strip_optional("Optional[A] | Optional[B]"),
            ("Optional[A] | Optional[B]", false)
        );
    }
}
