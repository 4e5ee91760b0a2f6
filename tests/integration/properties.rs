use neandoc::extract::grammar::{accepts, is_class_name, is_identifier, is_import_path};
use neandoc::lang::ALL_LANGUAGES;
use neandoc::{extract_source, CodeStructure, Config, FileStatus, Pipeline, RunMode, Unavailable};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Source-like text: real declarations mixed with noise.
fn source_text() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        Just("function add(a, b) {\n".to_string()),
        Just("class Widget {\n".to_string()),
        Just("def run(self):\n".to_string()),
        Just("import os\n".to_string()),
        Just("pub fn load() {\n".to_string()),
        Just("public void go() {\n".to_string()),
        Just("#include <stdio.h>\n".to_string()),
        Just("\r\n".to_string()),
        Just(" * Signature: function add(a, b)\n".to_string()),
        "[a-zA-Z_ (){}=;:.,'\"\t\n]{0,24}",
        "\\PC{0,12}",
    ];
    prop::collection::vec(piece, 0..40).prop_map(|pieces| pieces.concat())
}

fn all_elements(structure: &CodeStructure) -> impl Iterator<Item = &neandoc::StructuralElement> {
    structure
        .functions
        .iter()
        .chain(&structure.classes)
        .chain(&structure.imports)
        .chain(&structure.exports)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn lines_are_one_plus_preceding_newlines(text in source_text()) {
        for language in ALL_LANGUAGES {
            let structure = extract_source("p", language, text.clone());
            for element in all_elements(&structure) {
                prop_assert!(element.offset <= text.len());
                let expected = 1 + text[..element.offset].matches('\n').count();
                prop_assert_eq!(element.line, expected, "{} in {}", element.name, language);
            }
        }
    }

    #[test]
    fn admitted_names_satisfy_their_grammar(
        name in prop_oneof![
            "\\PC{0,80}",
            "[a-z]{60,80}",
            Just("<script>".to_string()),
            Just("a'b".to_string()),
            Just("x;rm -rf /".to_string()),
            Just("1abc".to_string()),
        ],
    ) {
        let text = format!(
            "function {name}() {{}}\nclass {name} {{}}\nimport '{name}';\nexport const {name} = 1;\n"
        );
        for language in ALL_LANGUAGES {
            let structure = extract_source("p", language, text.clone());
            for function in &structure.functions {
                prop_assert!(is_identifier(&function.name), "{:?}", function.name);
            }
            for class in &structure.classes {
                prop_assert!(is_class_name(&class.name), "{:?}", class.name);
            }
            for import in &structure.imports {
                prop_assert!(is_import_path(&import.name), "{:?}", import.name);
            }
            for element in all_elements(&structure) {
                prop_assert!(accepts(element.kind, &element.name));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn second_run_changes_nothing(
        names in prop::collection::btree_set("[a-z][a-zA-Z0-9_]{0,10}", 1..6),
    ) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gen.js");
        let source: String = names
            .iter()
            .map(|n| format!("function {n}(x) {{\n  return x;\n}}\n\n"))
            .collect();
        fs::write(&file, &source).unwrap();

        let pipeline = Pipeline::from_config(&Config::default(), Unavailable);
        let first = pipeline.run(&[&file], RunMode::Apply);
        prop_assert!(matches!(first[0].status, FileStatus::Applied(_)));
        let documented = fs::read_to_string(&file).unwrap();
        prop_assert_eq!(documented.matches("Technical Explanation:").count(), names.len());

        let second = pipeline.run(&[&file], RunMode::Apply);
        prop_assert!(matches!(second[0].status, FileStatus::Unchanged));
        prop_assert_eq!(fs::read_to_string(&file).unwrap(), documented);
    }
}
