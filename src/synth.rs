//! Comment synthesis.
//!
//! Turns a documentation gap into the literal block that will be inserted
//! above the element, using externally supplied text when there is some and
//! deterministic templates otherwise.

use crate::comment::{render_block, CommentStyle, Section};
use crate::gaps::FileGaps;
use crate::model::{CodeStructure, ElementKind, StructuralElement};
use crate::source::DocPayload;
use serde::{Deserialize, Serialize};

/// Language of the fallback templates and section labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "de")]
    German,
}

impl Locale {
    fn technical_label(self) -> &'static str {
        match self {
            Locale::English => "Technical Explanation",
            Locale::German => "Technische Erklärung",
        }
    }

    fn simple_label(self) -> &'static str {
        match self {
            Locale::English => "Simple Explanation",
            Locale::German => "Einfache Erklärung",
        }
    }
}

/// A technical and a simple explanation of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocText {
    #[serde(default)]
    pub technical: String,
    #[serde(default)]
    pub simple: String,
}

/// The element an insertion was synthesized for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub name: String,
    pub kind: ElementKind,
    /// Element line in the snapshot the insertion was computed from
    pub line: usize,
}

impl From<&StructuralElement> for ElementRef {
    fn from(element: &StructuralElement) -> Self {
        Self {
            name: element.name.clone(),
            kind: element.kind,
            line: element.line,
        }
    }
}

/// A block to splice into a file. Consumed by the mutation engine.
///
/// `content` is inserted before the 1-based `insertion_line` of the file as
/// it was when the insertion was computed.
#[derive(Debug, PartialEq, Eq)]
pub struct CommentInsertion {
    pub element: ElementRef,
    pub insertion_line: usize,
    pub content: String,
}

impl CommentInsertion {
    pub fn new(element: ElementRef, content: String) -> Self {
        let insertion_line = insertion_line_for(element.line);
        Self {
            element,
            insertion_line,
            content,
        }
    }
}

/// `max(1, element_line - 1)`
pub fn insertion_line_for(element_line: usize) -> usize {
    element_line.saturating_sub(1).max(1)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommentSynthesizer {
    pub functions_only: bool,
    pub locale: Locale,
}

impl CommentSynthesizer {
    pub fn new(functions_only: bool, locale: Locale) -> Self {
        Self {
            functions_only,
            locale,
        }
    }

    /// Build the insertion for one element of `structure`.
    ///
    /// Returns `None` for imports and exports, and for classes when the
    /// synthesizer is restricted to functions. Blank payload fields fall
    /// back to the template for that field.
    pub fn synthesize(
        &self,
        structure: &CodeStructure,
        element: &StructuralElement,
        payload: Option<&DocText>,
    ) -> Option<CommentInsertion> {
        match element.kind {
            ElementKind::Function => {}
            ElementKind::Class if !self.functions_only => {}
            _ => return None,
        }

        let template = self.template(element);
        let pick = |external: Option<&String>, fallback: String| match external {
            Some(text) if !text.trim().is_empty() => text.clone(),
            _ => fallback,
        };
        let technical = pick(payload.map(|p| &p.technical), template.technical);
        let simple = pick(payload.map(|p| &p.simple), template.simple);

        let style = CommentStyle::for_language(structure.language());
        let content = render_block(
            style,
            &element.indent,
            &[
                Section {
                    label: self.locale.technical_label(),
                    body: &technical,
                },
                Section {
                    label: self.locale.simple_label(),
                    body: &simple,
                },
            ],
        );

        Some(CommentInsertion::new(ElementRef::from(element), content))
    }

    /// One insertion per gap, using the payload entry for the element when
    /// the payload has one.
    pub fn synthesize_gaps(&self, gaps: &FileGaps<'_>, payload: &DocPayload) -> Vec<CommentInsertion> {
        let structure = gaps.structure;
        gaps.gaps
            .iter()
            .filter_map(|gap| {
                let element = gap.element;
                let text = payload.find(structure.path(), &element.name, element.line);
                self.synthesize(structure, element, text)
            })
            .collect()
    }

    fn template(&self, element: &StructuralElement) -> DocText {
        let name = &element.name;
        match (element.kind, self.locale) {
            (ElementKind::Class, Locale::English) => DocText {
                technical: format!(
                    "The class '{name}' encapsulates related data and behavior.\n\
                     It implements specific logic behind a defined interface."
                ),
                simple: "This class is like a blueprint: it describes how something is built and how it works."
                    .to_string(),
            },
            (ElementKind::Class, Locale::German) => DocText {
                technical: format!(
                    "Die Klasse '{name}' kapselt zusammengehörige Daten und Methoden.\n\
                     Sie implementiert spezifische Geschäftslogik und bietet eine definierte Schnittstelle."
                ),
                simple: "Diese Klasse ist wie ein Bauplan: sie beschreibt, wie etwas aufgebaut ist und funktioniert."
                    .to_string(),
            },
            (_, Locale::English) => DocText {
                technical: with_signature(
                    format!("The function '{name}' performs a specific operation."),
                    "Signature",
                    element,
                ),
                simple: "This function is like a tool: it takes something in and gives something back."
                    .to_string(),
            },
            (_, Locale::German) => DocText {
                technical: with_signature(
                    format!("Die Funktion '{name}' führt eine spezifische Operation aus."),
                    "Signatur",
                    element,
                ),
                simple: "Diese Funktion ist wie ein Werkzeug: sie nimmt etwas entgegen und gibt etwas zurück."
                    .to_string(),
            },
        }
    }
}

fn with_signature(mut sentence: String, label: &str, element: &StructuralElement) -> String {
    if let Some(signature) = element.signature.as_deref() {
        let collapsed = signature.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() {
            sentence.push_str(&format!("\n{label}: {collapsed}"));
        }
    }
    sentence
}
