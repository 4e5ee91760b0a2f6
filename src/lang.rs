//! Language tags and the closed extension table.
//!
//! Every supported language is a variant of [`Language`]; the extractor
//! dispatches on the variant to pick its ordered rule list, so adding a
//! language means adding a variant, an extension mapping and a rule list.

use std::fmt;
use std::path::Path;

/// Languages the extractor has rules for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Java,
    C,
    Cpp,
    CSharp,
    Php,
    Ruby,
    Go,
    Rust,
}

/// Every supported language, in table order.
pub const ALL_LANGUAGES: [Language; 11] = [
    Language::JavaScript,
    Language::TypeScript,
    Language::Python,
    Language::Java,
    Language::C,
    Language::Cpp,
    Language::CSharp,
    Language::Php,
    Language::Ruby,
    Language::Go,
    Language::Rust,
];

impl Language {
    /// Map a file extension (without the leading dot) to a language.
    ///
    /// Matching is case-insensitive. Unknown extensions yield `None`, which
    /// callers treat as "nothing to extract" rather than an error.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lang = match ext.to_ascii_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "py" | "pyw" => Language::Python,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            "go" => Language::Go,
            "rs" => Language::Rust,
            _ => return None,
        };
        Some(lang)
    }

    /// Map a path to a language using its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Short stable tag, also used as the code fence label in requests.
    pub fn tag(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Go => "go",
            Language::Rust => "rust",
        }
    }

    /// Languages whose comments start with `#` and have no `/* */` form.
    pub fn uses_hash_comments(self) -> bool {
        matches!(self, Language::Python | Language::Ruby)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
