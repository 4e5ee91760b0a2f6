//! Extraction data model.
//!
//! A [`CodeStructure`] is built once per analysis pass from an immutable text
//! snapshot. Line numbers and byte offsets inside it always refer to that
//! snapshot; after the file is mutated the structure is stale and the file
//! has to be extracted again.

use crate::lang::Language;
use std::fmt;
use std::path::{Path, PathBuf};

/// Category of a structural element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Function,
    Class,
    Import,
    Export,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Function => "function",
            ElementKind::Class => "class",
            ElementKind::Import => "import",
            ElementKind::Export => "export",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function, class, import or export found in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralElement {
    /// Identifier (or the import path for imports), already validated
    pub name: String,
    pub kind: ElementKind,
    /// 1-based line of the match start
    pub line: usize,
    /// Byte offset of the match start in the snapshot
    pub offset: usize,
    /// Text from the match start up to the block opener, trimmed
    pub signature: Option<String>,
    /// Module path for imports
    pub import_path: Option<String>,
    /// Leading whitespace of the element's line
    pub indent: String,
}

/// Flat structural view of one file.
#[derive(Debug, Clone)]
pub struct CodeStructure {
    path: PathBuf,
    language: Option<Language>,
    text: String,
    pub functions: Vec<StructuralElement>,
    pub classes: Vec<StructuralElement>,
    pub imports: Vec<StructuralElement>,
    pub exports: Vec<StructuralElement>,
}

impl CodeStructure {
    /// An empty structure over `text`.
    pub fn empty(path: impl Into<PathBuf>, language: Option<Language>, text: String) -> Self {
        Self {
            path: path.into(),
            language,
            text,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the extension is not in the language table.
    pub fn language(&self) -> Option<Language> {
        self.language
    }

    /// The snapshot every position in this structure refers to.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.classes.is_empty()
            && self.imports.is_empty()
            && self.exports.is_empty()
    }

    /// Total number of elements across all categories.
    pub fn len(&self) -> usize {
        self.functions.len() + self.classes.len() + self.imports.len() + self.exports.len()
    }

    /// Elements of one category.
    pub fn elements(&self, kind: ElementKind) -> &[StructuralElement] {
        match kind {
            ElementKind::Function => &self.functions,
            ElementKind::Class => &self.classes,
            ElementKind::Import => &self.imports,
            ElementKind::Export => &self.exports,
        }
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    pub(crate) fn elements_mut(&mut self, kind: ElementKind) -> &mut Vec<StructuralElement> {
        match kind {
            ElementKind::Function => &mut self.functions,
            ElementKind::Class => &mut self.classes,
            ElementKind::Import => &mut self.imports,
            ElementKind::Export => &mut self.exports,
        }
    }

    /// Functions and classes, the elements that carry documentation.
    pub fn documentable(&self) -> impl Iterator<Item = &StructuralElement> {
        self.functions.iter().chain(self.classes.iter())
    }
}

/// Newline offsets of a snapshot, for O(log n) offset-to-line lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let newlines = text
            .bytes()
            .enumerate()
            .filter_map(|(i, b)| (b == b'\n').then_some(i))
            .collect();
        Self { newlines }
    }

    /// 1 + number of `\n` strictly before `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        1 + self.newlines.partition_point(|&nl| nl < offset)
    }

    /// Byte offset where the line containing `offset` starts.
    pub fn line_start(&self, offset: usize) -> usize {
        let preceding = self.newlines.partition_point(|&nl| nl < offset);
        if preceding == 0 {
            0
        } else {
            self.newlines[preceding - 1] + 1
        }
    }

    pub fn line_count(&self) -> usize {
        self.newlines.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_of_counts_preceding_newlines() {
        let text = "a\nbb\n\nccc";
        let index = LineIndex::new(text);
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(1), 1); // the newline itself is on line 1
        assert_eq!(index.line_of(2), 2);
        assert_eq!(index.line_of(5), 3);
        assert_eq!(index.line_of(6), 4);
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn line_start_finds_beginning_of_line() {
        let text = "one\n  two\nthree";
        let index = LineIndex::new(text);
        assert_eq!(index.line_start(0), 0);
        assert_eq!(index.line_start(6), 4);
        assert_eq!(index.line_start(12), 10);
    }

    #[test]
    fn empty_structure_reports_empty() {
        let s = CodeStructure::empty("x.js", Some(Language::JavaScript), String::new());
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert_eq!(s.documentable().count(), 0);
    }
}
