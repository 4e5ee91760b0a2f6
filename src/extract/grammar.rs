//! Identifier grammars candidates must satisfy before they are admitted.
//!
//! Pattern rules capture generously; these checks decide. A candidate that
//! fails is dropped without an error.

use crate::model::ElementKind;

/// Maximum identifier length (leading character included).
pub const MAX_IDENT_LEN: usize = 64;

/// Maximum import path length.
pub const MAX_IMPORT_PATH_LEN: usize = 256;

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Functions, variables and exported names.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => {}
        _ => return false,
    }
    name.len() <= MAX_IDENT_LEN && chars.all(is_ident_continue)
}

/// Class names: leading ASCII uppercase letter, identifier tail.
pub fn is_class_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase()) && is_identifier(name)
}

/// Import paths: bounded, printable, no whitespace, quotes or shell/markup
/// metacharacters.
pub fn is_import_path(path: &str) -> bool {
    !path.is_empty()
        && path.len() <= MAX_IMPORT_PATH_LEN
        && !path.chars().any(|c| {
            c.is_control()
                || c.is_whitespace()
                || matches!(c, '"' | '\'' | '`' | '<' | '>' | '|' | ';' | '\0')
        })
}

/// Apply the grammar of `kind` to a candidate.
pub fn accepts(kind: ElementKind, candidate: &str) -> bool {
    match kind {
        ElementKind::Function | ElementKind::Export => is_identifier(candidate),
        ElementKind::Class => is_class_name(candidate),
        ElementKind::Import => is_import_path(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("add"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("$jquery"));
        assert!(is_identifier("snake_case_2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("has-dash"));
        assert!(!is_identifier("semi;colon"));
        assert!(!is_identifier("Vec<T>"));
        assert!(!is_identifier("ünïcode"));
    }

    #[test]
    fn identifier_length_cap() {
        let ok = "a".repeat(MAX_IDENT_LEN);
        let too_long = "a".repeat(MAX_IDENT_LEN + 1);
        assert!(is_identifier(&ok));
        assert!(!is_identifier(&too_long));
    }

    #[test]
    fn class_names_need_uppercase_start() {
        assert!(is_class_name("TestClass"));
        assert!(!is_class_name("testClass"));
        assert!(!is_class_name("_Hidden"));
        assert!(!is_class_name("Bad<Name>"));
    }

    #[test]
    fn import_paths() {
        assert!(is_import_path("./utils/helpers"));
        assert!(is_import_path("os.path"));
        assert!(is_import_path("java.util.*"));
        assert!(is_import_path("App\\Models\\User"));
        assert!(is_import_path("@scope/pkg"));
        assert!(!is_import_path(""));
        assert!(!is_import_path("a b"));
        assert!(!is_import_path("x\u{7}y"));
        assert!(!is_import_path("evil;rm"));
        assert!(!is_import_path(&"p".repeat(MAX_IMPORT_PATH_LEN + 1)));
    }

    #[test]
    fn accepts_dispatches_on_kind() {
        assert!(accepts(ElementKind::Function, "lowercase"));
        assert!(!accepts(ElementKind::Class, "lowercase"));
        assert!(accepts(ElementKind::Import, "./a.js"));
        assert!(accepts(ElementKind::Export, "thing"));
    }
}
