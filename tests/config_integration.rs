//! Config loading, validation and its effect on a pipeline run.

use neandoc::config::{
    load_from_path, load_from_str, Config, ConfigError, Origin, ValidationIssue, MAX_WINDOW,
};
use neandoc::{Locale, Pipeline, RunMode, Unavailable};
use std::fs;
use tempfile::TempDir;

fn issues(input: &str) -> Vec<ValidationIssue> {
    match load_from_str(input) {
        Err(ConfigError::Invalid { source, .. }) => source.issues,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn full_config_parses() {
    let config = load_from_str(
        r#"
[analysis]
window = 12

[mutation]
window = 20
backup_suffix = ".orig"

[synthesis]
functions_only = true
locale = "de"
"#,
    )
    .unwrap();

    assert_eq!(config.analysis.window, 12);
    assert_eq!(config.mutation.window, 20);
    assert_eq!(config.mutation.backup_suffix, ".orig");
    assert!(config.synthesis.functions_only);
    assert_eq!(config.synthesis.locale, Locale::German);
}

#[test]
fn partial_config_keeps_other_defaults() {
    let config = load_from_str("[synthesis]\nfunctions_only = true\n").unwrap();
    assert!(config.synthesis.functions_only);
    assert_eq!(config.analysis, Config::default().analysis);
    assert_eq!(config.mutation, Config::default().mutation);
}

#[test]
fn window_bounds_are_enforced() {
    assert_eq!(
        issues("[analysis]\nwindow = 0\n"),
        vec![ValidationIssue::OutOfRange {
            field: "analysis.window",
            value: 0
        }]
    );
    assert_eq!(
        issues(&format!("[mutation]\nwindow = {}\n", MAX_WINDOW + 1)),
        vec![ValidationIssue::OutOfRange {
            field: "mutation.window",
            value: MAX_WINDOW + 1
        }]
    );
    assert!(load_from_str(&format!("[analysis]\nwindow = {MAX_WINDOW}\n")).is_ok());
}

#[test]
fn backup_suffix_is_checked() {
    let found = issues("[mutation]\nbackup_suffix = \"bak\"\n");
    assert!(matches!(
        found.as_slice(),
        [ValidationIssue::InvalidSuffix { message: "must start with '.'", .. }]
    ));

    let found = issues("[mutation]\nbackup_suffix = \"./x\"\n");
    assert!(matches!(
        found.as_slice(),
        [ValidationIssue::InvalidSuffix { message: "must not contain a path separator", .. }]
    ));
}

#[test]
fn every_issue_is_reported_together() {
    let err = load_from_str("[analysis]\nwindow = 0\n[mutation]\nwindow = 5000\nbackup_suffix = \"\"\n")
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("analysis.window"));
    assert!(message.contains("mutation.window"));
    assert!(message.contains("must not be empty"));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = load_from_str("[analysis]\nwindow = 5\nwidnow = 6\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));

    let err = load_from_str("[reporting]\nenabled = true\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn unknown_locale_is_rejected() {
    let err = load_from_str("[synthesis]\nlocale = \"fr\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn path_errors_name_the_file() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("absent.toml");
    let err = load_from_path(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.toml"));

    let invalid = dir.path().join("neandoc.toml");
    fs::write(&invalid, "[analysis]\nwindow = 0\n").unwrap();
    let err = load_from_path(&invalid).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { origin: Origin::File(_), .. }));
    assert!(err.to_string().contains("neandoc.toml"));
}

#[test]
fn loaded_config_drives_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("neandoc.toml");
    fs::write(
        &config_path,
        "[mutation]\nbackup_suffix = \".keep\"\n\n[synthesis]\nfunctions_only = true\nlocale = \"de\"\n",
    )
    .unwrap();
    let config = load_from_path(&config_path).unwrap();

    let file = dir.path().join("shapes.js");
    fs::write(&file, "class Shape {}\n\nfunction area(s) {\n  return 0;\n}\n").unwrap();

    let pipeline = Pipeline::from_config(&config, Unavailable);
    assert_eq!(
        pipeline.engine().backup_path(&file),
        dir.path().join("shapes.js.keep")
    );

    let outcomes = pipeline.run(&[&file], RunMode::Apply);
    assert!(!outcomes[0].is_failure());

    let content = fs::read_to_string(&file).unwrap();
    assert_eq!(content.matches("Technische Erklärung:").count(), 1);
    assert!(content.contains("Die Funktion 'area'"));
    assert!(!content.contains("'Shape'"));
}
