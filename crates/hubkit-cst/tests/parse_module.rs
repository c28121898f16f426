// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use hubkit_cst::visitor::{imported_objects, ClassMethodCollector, ModulesCollector};
use hubkit_cst::{
    parse_module, ArgumentsCollector, CompoundStatement, DataclassFieldCollector, ParserError,
    Statement,
};

fn fixture_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_dir().join(name)).expect("reading fixture")
}

fn all_fixtures() -> impl Iterator<Item = (PathBuf, String)> {
    fixture_dir()
        .read_dir()
        .expect("read_dir")
        .map(|entry| {
            let path = entry.unwrap().path();
            let contents = std::fs::read_to_string(&path).expect("reading file");
            (path, contents)
        })
}

#[test]
fn fixtures_parse_losslessly() {
    for (path, input) in all_fixtures() {
        let module = match parse_module(&input) {
            Ok(module) => module,
            Err(e) => panic!("{}:{}:{}: {}", path.display(), e.line(), e.col(), e.message()),
        };
        assert_eq!(module.code(), input, "{}", path.display());
        assert!(!module.body.is_empty(), "{}", path.display());
    }
}

#[test]
fn statement_spans_tile_the_module() {
    for (path, input) in all_fixtures() {
        let module = parse_module(&input).unwrap();
        let mut last_end = 0;
        for statement in &module.body {
            let span = statement.span();
            assert!(span.start >= last_end, "{}: {}", path.display(), span);
            // Only blank lines and comments separate top-level statements.
            for line in input[last_end..span.start].lines() {
                let line = line.trim();
                assert!(
                    line.is_empty() || line.starts_with('#'),
                    "{}: unexpected text {:?}",
                    path.display(),
                    line
                );
            }
            last_end = span.end;
        }
    }
}

#[test]
fn client_fixture_structure() {
    let source = fixture("client.py");
    let module = parse_module(&source).unwrap();

    let class = module
        .body
        .iter()
        .find_map(|s| match s {
            Statement::Compound(CompoundStatement::ClassDef(c)) => Some(c),
            _ => None,
        })
        .unwrap();
    assert_eq!(class.name.value, "InferenceClient");

    let methods = ClassMethodCollector::collect(&module, "InferenceClient");
    assert_eq!(
        methods,
        vec![
            "__init__",
            "__repr__",
            "_inner_post",
            "audio_classification",
            "text_classification",
            "get_endpoint_info"
        ]
    );

    let args = ArgumentsCollector::collect(&module, "audio_classification");
    assert_eq!(
        args.into_iter().collect::<Vec<_>>(),
        vec!["audio", "function_to_apply", "model", "top_k"]
    );
}

#[test]
fn client_fixture_imports() {
    let source = fixture("client.py");
    let module = parse_module(&source).unwrap();
    let objects = imported_objects(&module, "huggingface_hub.inference");
    assert!(objects["huggingface_hub.inference._generated.types"]
        .contains("TextClassificationOutputElement"));
    assert!(objects["typing"].contains("Optional"));
    assert!(objects["PIL.Image"].contains("Image"));
}

#[test]
fn types_fixture_fields() {
    let source = fixture("text_classification.py");
    let module = parse_module(&source).unwrap();
    let fields = DataclassFieldCollector::collect(&module, "TextClassificationParameters");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "function_to_apply");
    assert_eq!(
        fields[0].annotation,
        "Optional[\"TextClassificationOutputTransform\"]"
    );
    assert_eq!(
        fields[1].description,
        "When specified, limits the output to the top K most probable classes."
    );

    let map = ModulesCollector::collect(&module, "pkg.types", "pkg.types");
    assert_eq!(map["TextClassificationParameters"], "pkg.types");
    assert_eq!(map["BaseInferenceType"], "pkg.types.base");
}

#[test]
fn syntax_errors_report_positions() {
    let cases: &[(&str, u32, u32)] = &[
        ("def f(:\n    pass\n", 1, 7),
        ("x = 'open\n", 1, 5),
        ("if x:\npass\n", 2, 1),
        ("class C\n    pass\n", 1, 8),
    ];
    for (source, line, col) in cases {
        let err: ParserError = parse_module(source).unwrap_err();
        assert_eq!((err.line(), err.col()), (*line, *col), "{source:?}: {err}");
    }
}
