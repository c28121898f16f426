// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! AddImportsTransformer: insert import lines after the leading import block.

use hubkit_core::text::line_start;

use super::batch_edit::EditPrimitive;
use super::traits::{Transformer, VisitResult, Visitor};
use crate::nodes::Module;

/// Inserts `lines` right after the module's leading run of import statements.
///
/// - If the module starts with a non-import statement, the lines go at the
///   start of that statement's line.
/// - If the module holds only imports, the lines are appended.
///
/// The insertion happens at most once per transformer.
pub struct AddImportsTransformer {
    lines: Vec<String>,
    added: bool,
    edits: Vec<EditPrimitive>,
}

impl AddImportsTransformer {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            added: false,
            edits: Vec::new(),
        }
    }

    /// True once the insertion has been recorded.
    pub fn added(&self) -> bool {
        self.added
    }
}

impl<'a> Visitor<'a> for AddImportsTransformer {
    fn visit_module(&mut self, node: &Module<'a>) -> VisitResult {
        if self.added || self.lines.is_empty() {
            return VisitResult::Stop;
        }

        let source = node.source;
        let block: String = self.lines.iter().map(|l| format!("{l}\n")).collect();
        let first_other = node.body.iter().position(|s| !s.is_import());

        let (position, text) = match first_other {
            Some(0) => (line_start(source, node.body[0].span().start), block),
            // Import lines end past their newline.
            Some(index) => (node.body[index - 1].span().end, block),
            None if source.is_empty() || source.ends_with('\n') => (source.len(), block),
            None => (source.len(), format!("\n{block}")),
        };

        self.edits.push(EditPrimitive::InsertAt { position, text });
        self.added = true;
        VisitResult::Stop
    }
}

impl<'a> Transformer<'a> for AddImportsTransformer {
    fn take_edits(&mut self) -> Vec<EditPrimitive> {
        std::mem::take(&mut self.edits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_module;
    use crate::visitor::transform_module;

    fn insert(source: &str, lines: &[&str]) -> String {
        let module = parse_module(source).unwrap();
        let mut t = AddImportsTransformer::new(lines.iter().map(|l| l.to_string()).collect());
        let out = transform_module(&mut t, &module).unwrap();
        assert!(t.added() || lines.is_empty());
        out
    }

    #[test]
    fn test_after_leading_imports() {
        let source = "import os\nfrom typing import List\n\n\nclass C:\n    pass\n";
        let out = insert(source, &["from pkg.types import Foo"]);
        assert_eq!(
            out,
            "import os\nfrom typing import List\nfrom pkg.types import Foo\n\n\nclass C:\n    pass\n"
        );
    }

    #[test]
    fn test_before_comment_attached_to_first_statement() {
        let source = "import os\n\n# Helper\nX = 1\n";
        let out = insert(source, &["from a import b"]);
        assert_eq!(out, "import os\nfrom a import b\n\n# Helper\nX = 1\n");
    }

    #[test]
    fn test_later_imports_are_not_part_of_leading_block() {
        let source = "import os\nX = 1\nimport sys\n";
        let out = insert(source, &["from a import b"]);
        assert_eq!(out, "import os\nfrom a import b\nX = 1\nimport sys\n");
    }

    #[test]
    fn test_first_statement_not_an_import() {
        let source = "X = 1\nimport os\n";
        let out = insert(source, &["from a import b", "from c import d"]);
        assert_eq!(out, "from a import b\nfrom c import d\nX = 1\nimport os\n");
    }

    #[test]
    fn test_only_imports_appends() {
        assert_eq!(
            insert("import os", &["from a import b"]),
            "import os\nfrom a import b\n"
        );
        assert_eq!(
            insert("import os\n", &["from a import b"]),
            "import os\nfrom a import b\n"
        );
    }

    #[test]
    fn test_empty_module() {
        assert_eq!(insert("", &["from a import b"]), "from a import b\n");
    }

    #[test]
    fn test_no_lines_is_identity() {
        let source = "import os\nX = 1\n";
        assert_eq!(insert(source, &[]), source);
    }

    #[test]
    fn test_inserted_once() {
        let source = "import os\nX = 1\n";
        let module = parse_module(source).unwrap();
        let mut t = AddImportsTransformer::new(vec!["from a import b".to_string()]);
        let first = transform_module(&mut t, &module).unwrap();
        let second = transform_module(&mut t, &module).unwrap();
        assert_eq!(first, "import os\nfrom a import b\nX = 1\n");
        assert_eq!(second, source);
    }
}
