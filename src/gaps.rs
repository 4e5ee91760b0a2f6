//! Documentation gap analysis.
//!
//! For each function and class, the `window` lines strictly above it are
//! searched for comment blocks carrying a technical and a simple section
//! marker. The two checks are independent, and a block shared by two
//! adjacent elements counts for both.

use crate::comment::{comment_runs, CommentStyle};
use crate::model::{CodeStructure, StructuralElement};

/// Lines examined above each element unless configured otherwise.
pub const DEFAULT_WINDOW: usize = 10;

/// Lowercase phrases that mark a technical section.
pub const TECHNICAL_MARKERS: &[&str] = &[
    "technical explanation",
    "technical description",
    "technische erklärung",
];

/// Lowercase phrases that mark a simple section.
pub const SIMPLE_MARKERS: &[&str] = &[
    "simple explanation",
    "plain explanation",
    "einfache erklärung",
];

/// Which documentation sections were found above an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocPresence {
    pub technical: bool,
    pub simple: bool,
}

/// An element missing at least one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentationGap<'a> {
    pub element: &'a StructuralElement,
    pub missing_technical: bool,
    pub missing_simple: bool,
}

/// Gaps of one file.
#[derive(Debug, Clone)]
pub struct FileGaps<'a> {
    pub structure: &'a CodeStructure,
    pub gaps: Vec<DocumentationGap<'a>>,
    /// Functions and classes examined
    pub total_elements: usize,
}

impl<'a> FileGaps<'a> {
    pub fn missing_technical(&self) -> Vec<&'a StructuralElement> {
        self.gaps
            .iter()
            .filter(|g| g.missing_technical)
            .map(|g| g.element)
            .collect()
    }

    pub fn missing_simple(&self) -> Vec<&'a StructuralElement> {
        self.gaps
            .iter()
            .filter(|g| g.missing_simple)
            .map(|g| g.element)
            .collect()
    }

    pub fn has_missing_docs(&self) -> bool {
        !self.gaps.is_empty()
    }

    /// Missing sections counted individually (an element missing both
    /// counts twice).
    pub fn missing_count(&self) -> usize {
        self.gaps
            .iter()
            .map(|g| usize::from(g.missing_technical) + usize::from(g.missing_simple))
            .sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GapAnalyzer {
    window: usize,
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl GapAnalyzer {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Sections present above `element`, given the snapshot's lines.
    pub fn element_docs(
        &self,
        lines: &[&str],
        style: CommentStyle,
        element: &StructuralElement,
    ) -> DocPresence {
        let end = element.line.saturating_sub(1).min(lines.len());
        let start = end.saturating_sub(self.window);
        let window = &lines[start..end];

        let mut presence = DocPresence::default();
        for run in comment_runs(window, style) {
            let block = window[run].join("\n").to_lowercase();
            presence.technical |= TECHNICAL_MARKERS.iter().any(|m| block.contains(m));
            presence.simple |= SIMPLE_MARKERS.iter().any(|m| block.contains(m));
        }
        presence
    }

    /// Check every function and class of `structure`.
    pub fn analyze<'a>(&self, structure: &'a CodeStructure) -> FileGaps<'a> {
        let lines: Vec<&str> = structure.text().split('\n').collect();
        let style = CommentStyle::for_language(structure.language());

        let mut gaps = Vec::new();
        let mut total_elements = 0;
        for element in structure.documentable() {
            total_elements += 1;
            let presence = self.element_docs(&lines, style, element);
            if !presence.technical || !presence.simple {
                gaps.push(DocumentationGap {
                    element,
                    missing_technical: !presence.technical,
                    missing_simple: !presence.simple,
                });
            }
        }

        FileGaps {
            structure,
            gaps,
            total_elements,
        }
    }
}
