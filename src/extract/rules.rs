//! Per-language ordered pattern rules.
//!
//! Every repetition in a rule is either capped (`{0,N}`) or closed by a
//! delimiter class it cannot consume, and the patterns run on the `regex`
//! crate's automata, which never backtrack. Together this keeps a search
//! proportional to input length even on hostile input such as megabytes of
//! a single character: bounded repetitions also bound how far each match can
//! reach back, so iterating over all matches stays linear.

use crate::lang::Language;
use crate::model::ElementKind;
use regex::Regex;
use std::sync::LazyLock;

/// Identifier capture. Wider than the grammar allows so that an overlong
/// name is captured whole and then rejected instead of being truncated into
/// a valid-looking prefix.
const IDENT: &str = r"[A-Za-z_$][A-Za-z0-9_$]{0,127}";

/// ASCII word boundary; keeps the DFA usable on non-ASCII haystacks.
const BOUNDARY: &str = r"(?-u:\b)";

/// Names that look like calls followed by a block but are control flow.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "catch", "return", "sizeof", "else", "do",
    "try", "using", "lock", "fixed", "synchronized", "new", "delete", "throw", "case",
];

/// How a rule's captures turn into element names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Capture {
    /// `name` group holds one identifier
    Name,
    /// `path` group holds one import path
    Path,
    /// `list` group holds a comma list such as `a, b as c`
    NameList,
    /// `list` group holds lines with quoted import paths
    QuotedPaths,
}

#[derive(Debug)]
pub(crate) struct Rule {
    pub kind: ElementKind,
    pub capture: Capture,
    pub regex: Regex,
    /// Captured names that are never elements for this rule
    pub reject: &'static [&'static str],
}

impl Rule {
    fn new(kind: ElementKind, capture: Capture, template: &str) -> Self {
        Self::rejecting(kind, capture, template, &[])
    }

    fn rejecting(
        kind: ElementKind,
        capture: Capture,
        template: &str,
        reject: &'static [&'static str],
    ) -> Self {
        let pattern = template.replace("{ID}", IDENT).replace("{B}", BOUNDARY);
        let regex = Regex::new(&pattern)
            .unwrap_or_else(|e| panic!("built-in extraction rule {pattern:?} is invalid: {e}"));
        Self {
            kind,
            capture,
            regex,
            reject,
        }
    }

    pub fn rejects(&self, name: &str) -> bool {
        self.reject.contains(&name)
    }
}

use Capture::{Name, NameList, Path, QuotedPaths};
use ElementKind::{Class, Export, Function, Import};

static JAVASCRIPT: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            Function,
            Name,
            r"{B}(?:async[ \t]+)?function(?:[ \t]*\*[ \t]*|[ \t]+)(?P<name>{ID})[ \t]*(?:<[^<>\n]{0,128}>[ \t]*)?\(",
        ),
        Rule::new(
            Function,
            Name,
            r"{B}(?:const|let|var)[ \t]+(?P<name>{ID})[ \t]*(?::[^=\n]{0,128})?=[ \t]*(?:async[ \t]+)?function{B}",
        ),
        Rule::new(
            Function,
            Name,
            r"{B}(?:const|let|var)[ \t]+(?P<name>{ID})[ \t]*(?::[^=\n]{0,128})?=[ \t]*(?:async[ \t]*)?(?:\([^()]{0,256}\)|{ID})[ \t]*(?::[^=\n]{0,128})?=>",
        ),
        Rule::new(
            Function,
            Name,
            r"{B}(?P<name>{ID})[ \t]*:[ \t]*(?:async[ \t]+)?function{B}",
        ),
        Rule::new(Class, Name, r"{B}class[ \t]+(?P<name>{ID})"),
        Rule::new(
            Import,
            Path,
            r#"{B}import[ \t]*(?:[^'";]{0,256}[ \t}\n]from[ \t]*)?['"](?P<path>[^'"\n]{1,256})['"]"#,
        ),
        Rule::new(
            Import,
            Path,
            r#"{B}require[ \t]*\([ \t]*['"](?P<path>[^'"\n]{1,256})['"][ \t]*\)"#,
        ),
        Rule::new(
            Export,
            Name,
            r"{B}export[ \t]+(?:default[ \t]+)?(?:declare[ \t]+)?(?:abstract[ \t]+)?(?:async[ \t]+)?(?:function\*?|class|const|let|var|interface|type|enum)[ \t]+(?P<name>{ID})",
        ),
        Rule::new(
            Export,
            NameList,
            r"{B}export[ \t]*(?:type[ \t]*)?\{(?P<list>[^{}]{0,512})\}",
        ),
    ]
});

static PYTHON: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            Function,
            Name,
            r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+(?P<name>{ID})[ \t]*\(",
        ),
        Rule::new(Class, Name, r"(?m)^[ \t]*class[ \t]+(?P<name>{ID})[ \t]*[(:]"),
        Rule::new(
            Import,
            Path,
            r"(?m)^[ \t]*from[ \t]+(?P<path>[A-Za-z0-9_.]{1,256})[ \t]+import{B}",
        ),
        Rule::new(
            Import,
            Path,
            r"(?m)^[ \t]*import[ \t]+(?P<path>[A-Za-z0-9_.]{1,256})",
        ),
    ]
});

/// Return type (possibly generic, array or qualified) then name then a
/// parameter list then the body brace. Shared by Java and C#.
const JVM_STYLE_METHOD: &str = r"(?m)^[ \t]*[A-Za-z_$@][A-Za-z0-9_$<>\[\],.?@ \t]{0,191}[ \t](?P<name>{ID})[ \t]*\([^()]{0,512}\)[ \t\r\n]*(?:throws[ \t]+[A-Za-z0-9_$., \t]{1,256})?(?::[ \t]*(?:base|this)[ \t]*\([^()]{0,256}\)[ \t\r\n]*)?\{";

static JAVA: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::rejecting(Function, Name, JVM_STYLE_METHOD, CONTROL_KEYWORDS),
        Rule::new(
            Class,
            Name,
            r"{B}(?:class|interface|enum|record)[ \t]+(?P<name>{ID})",
        ),
        Rule::new(
            Import,
            Path,
            r"(?m)^[ \t]*import[ \t]+(?:static[ \t]+)?(?P<path>[A-Za-z0-9_$.*]{1,256})[ \t]*;",
        ),
    ]
});

static CSHARP: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::rejecting(Function, Name, JVM_STYLE_METHOD, CONTROL_KEYWORDS),
        Rule::new(
            Class,
            Name,
            r"{B}(?:class|interface|struct|record|enum)[ \t]+(?P<name>{ID})",
        ),
        Rule::new(
            Import,
            Path,
            r"(?m)^[ \t]*using[ \t]+(?:static[ \t]+)?(?P<path>[A-Za-z0-9_.]{1,256})[ \t]*;",
        ),
    ]
});

const C_INCLUDE: &str = r#"(?m)^[ \t]*#[ \t]*include[ \t]*[<"](?P<path>[^<>"\n]{1,256})[>"]"#;

static C: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::rejecting(
            Function,
            Name,
            r"(?m)^[ \t]*[A-Za-z_][A-Za-z0-9_ \t*]{0,127}[ \t*](?P<name>{ID})[ \t]*\([^()]{0,512}\)[ \t\r\n]*\{",
            CONTROL_KEYWORDS,
        ),
        Rule::new(Import, Path, C_INCLUDE),
    ]
});

static CPP: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::rejecting(
            Function,
            Name,
            r"(?m)^[ \t]*[A-Za-z_][A-Za-z0-9_:<>, \t*&]{0,127}[ \t*&](?:{ID}::){0,4}(?P<name>{ID})[ \t]*\([^()]{0,512}\)[ \t\r\n]*(?:const[ \t\r\n]*)?(?:noexcept[ \t\r\n]*)?(?:override[ \t\r\n]*)?\{",
            CONTROL_KEYWORDS,
        ),
        Rule::new(Class, Name, r"{B}(?:class|struct)[ \t]+(?P<name>{ID})"),
        Rule::new(Import, Path, C_INCLUDE),
    ]
});

static PHP: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            Function,
            Name,
            r"{B}function[ \t]+&?[ \t]*(?P<name>{ID})[ \t]*\(",
        ),
        Rule::new(
            Class,
            Name,
            r"{B}(?:class|interface|trait|enum)[ \t]+(?P<name>{ID})",
        ),
        Rule::new(
            Import,
            Path,
            r"(?m)^[ \t]*use[ \t]+(?P<path>[A-Za-z0-9_\\]{1,256})[ \t]*(?:as[ \t]+{ID}[ \t]*)?;",
        ),
        Rule::new(
            Import,
            Path,
            r#"{B}(?:require|include)(?:_once)?[ \t]*\(?[ \t]*['"](?P<path>[^'"\n]{1,256})['"]"#,
        ),
    ]
});

static RUBY: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            Function,
            Name,
            r"(?m)^[ \t]*def[ \t]+(?:self\.)?(?P<name>{ID})",
        ),
        Rule::new(
            Class,
            Name,
            r"(?m)^[ \t]*(?:class|module)[ \t]+(?P<name>{ID})",
        ),
        Rule::new(
            Import,
            Path,
            r#"(?m)^[ \t]*require(?:_relative)?[ \t(]*['"](?P<path>[^'"\n]{1,256})['"]"#,
        ),
    ]
});

static GO: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            Function,
            Name,
            r"(?m)^func[ \t]*(?:\([^()\n]{0,256}\)[ \t]*)?(?P<name>{ID})[ \t]*(?:\[[^\[\]\n]{0,256}\][ \t]*)?\(",
        ),
        Rule::new(
            Class,
            Name,
            r"(?m)^type[ \t]+(?P<name>{ID})[ \t]*(?:\[[^\[\]\n]{0,256}\])?[ \t]+(?:struct|interface){B}",
        ),
        Rule::new(
            Import,
            Path,
            r#"(?m)^import[ \t]+(?:[A-Za-z0-9_.]{1,64}[ \t]+)?"(?P<path>[^"\n]{1,256})""#,
        ),
        Rule::new(
            Import,
            QuotedPaths,
            r"(?m)^import[ \t]*\((?P<list>[^()]{0,2048})\)",
        ),
    ]
});

/// Optional `pub` / `pub(crate)` visibility prefix for Rust items.
const RUST_VIS: &str = r"(?:pub(?:\([A-Za-z0-9_: ]{1,64}\))?[ \t]+)?";

static RUST: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            Function,
            Name,
            &format!(
                r#"(?m)^[ \t]*{RUST_VIS}(?:(?:const|async|unsafe|extern(?:[ \t]+"[A-Za-z0-9-]{{1,16}}")?)[ \t]+){{0,3}}fn[ \t]+(?P<name>{{ID}})"#
            ),
        ),
        Rule::new(
            Class,
            Name,
            &format!(
                r"(?m)^[ \t]*{RUST_VIS}(?:struct|enum|trait|union)[ \t]+(?P<name>{{ID}})"
            ),
        ),
        Rule::new(
            Import,
            Path,
            &format!(r"(?m)^[ \t]*{RUST_VIS}use[ \t]+(?P<path>[A-Za-z0-9_:]{{1,256}})"),
        ),
    ]
});

/// The ordered rule list for `lang`.
pub(crate) fn rules_for(lang: Language) -> &'static [Rule] {
    match lang {
        Language::JavaScript | Language::TypeScript => &JAVASCRIPT,
        Language::Python => &PYTHON,
        Language::Java => &JAVA,
        Language::C => &C,
        Language::Cpp => &CPP,
        Language::CSharp => &CSHARP,
        Language::Php => &PHP,
        Language::Ruby => &RUBY,
        Language::Go => &GO,
        Language::Rust => &RUST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ALL_LANGUAGES;

    #[test]
    fn every_rule_compiles() {
        for lang in ALL_LANGUAGES {
            let rules = rules_for(lang);
            assert!(!rules.is_empty(), "{lang} has no rules");
            for rule in rules {
                let group = match rule.capture {
                    Capture::Name => "name",
                    Capture::Path => "path",
                    Capture::NameList | Capture::QuotedPaths => "list",
                };
                assert!(
                    rule.regex.capture_names().flatten().any(|n| n == group),
                    "{lang} rule {:?} lacks group {group}",
                    rule.regex.as_str()
                );
            }
        }
    }

    #[test]
    fn control_keywords_are_rejected() {
        let rule = &rules_for(Language::C)[0];
        assert!(rule.rejects("while"));
        assert!(!rule.rejects("main"));
    }

    #[test]
    fn placeholders_are_expanded() {
        for lang in ALL_LANGUAGES {
            for rule in rules_for(lang) {
                let src = rule.regex.as_str();
                assert!(!src.contains("{ID}"), "{src}");
                assert!(!src.contains("{B}"), "{src}");
            }
        }
    }
}
