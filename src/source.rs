//! Documentation source collaborator.
//!
//! Externally generated explanations come back as a [`DocPayload`]. The
//! loop is human-mediated: [`render_request`] formats the gaps as a request
//! for an external assistant, and its JSON answer is later read back by
//! [`PayloadFile`]. Any failure here is recoverable; callers fall back to
//! templates.

use crate::gaps::FileGaps;
use crate::synth::DocText;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Lines of code shown before an element in a request.
pub const CONTEXT_BEFORE: usize = 5;
/// Lines of code shown from the element line on.
pub const CONTEXT_AFTER: usize = 10;
/// Characters kept per context line.
pub const CONTEXT_LINE_LIMIT: usize = 240;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("documentation source unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read payload {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid payload in {}: {source}", path.display())]
    Payload {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One externally supplied explanation pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadEntry {
    pub file: PathBuf,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(flatten)]
    pub text: DocText,
}

/// Explanations keyed by file, element name and line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocPayload {
    #[serde(default)]
    pub entries: Vec<PayloadEntry>,
}

impl DocPayload {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse an answer. A bare JSON document is accepted, as is an answer
    /// whose JSON sits inside a fenced code block.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str(text) {
            Ok(payload) => Ok(payload),
            Err(err) => match fenced_json(text) {
                Some(inner) => serde_json::from_str(inner),
                None => Err(err),
            },
        }
    }

    /// Entry for an element: an exact (file, name, line) match first, then
    /// any entry with the same file and name.
    pub fn find(&self, file: &Path, name: &str, line: usize) -> Option<&DocText> {
        let candidates = || {
            self.entries
                .iter()
                .filter(move |e| e.name == name && same_file(file, &e.file))
        };
        candidates()
            .find(|e| e.line == Some(line))
            .or_else(|| candidates().next())
            .map(|e| &e.text)
    }
}

fn same_file(actual: &Path, named: &Path) -> bool {
    actual == named || (!named.as_os_str().is_empty() && actual.ends_with(named))
}

fn fenced_json(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let len = text[start..].find("```")?;
    Some(text[start..start + len].trim())
}

/// Where externally generated explanations come from.
pub trait DocumentationSource {
    fn fetch(&self, gaps: &[FileGaps<'_>]) -> Result<DocPayload, SourceError>;
}

impl<T: DocumentationSource + ?Sized> DocumentationSource for Box<T> {
    fn fetch(&self, gaps: &[FileGaps<'_>]) -> Result<DocPayload, SourceError> {
        (**self).fetch(gaps)
    }
}

/// A source that never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl DocumentationSource for Unavailable {
    fn fetch(&self, _gaps: &[FileGaps<'_>]) -> Result<DocPayload, SourceError> {
        Err(SourceError::Unavailable(
            "no documentation payload configured".to_string(),
        ))
    }
}

/// Answers read from a JSON file written by the external assistant.
#[derive(Debug, Clone)]
pub struct PayloadFile {
    path: PathBuf,
}

impl PayloadFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentationSource for PayloadFile {
    fn fetch(&self, _gaps: &[FileGaps<'_>]) -> Result<DocPayload, SourceError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let payload = DocPayload::parse(&text).map_err(|source| SourceError::Payload {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), entries = payload.entries.len(), "loaded payload");
        Ok(payload)
    }
}

/// Format the gaps of several files as one request for the external
/// assistant, ending with the exact JSON shape to answer with.
pub fn render_request(files: &[FileGaps<'_>]) -> String {
    let files: Vec<&FileGaps<'_>> = files.iter().filter(|f| f.has_missing_docs()).collect();
    if files.is_empty() {
        return "All functions and classes are documented.\n".to_string();
    }

    let mut out = String::new();
    let total: usize = files.iter().map(|f| f.gaps.len()).sum();
    let _ = writeln!(out, "NEANDOC DOCUMENTATION REQUEST\n");
    let _ = writeln!(
        out,
        "{total} element(s) in {} file(s) need documentation. For each one, write a",
        files.len()
    );
    let _ = writeln!(
        out,
        "technical explanation for developers and a simple explanation using an"
    );
    let _ = writeln!(out, "everyday comparison.\n");

    let mut template = DocPayload::default();
    for file in &files {
        let structure = file.structure;
        let fence = structure.language().map(|l| l.tag()).unwrap_or("");
        let lines: Vec<&str> = structure.text().split('\n').collect();
        let _ = writeln!(out, "## {}\n", structure.path().display());

        for gap in &file.gaps {
            let element = gap.element;
            let missing = match (gap.missing_technical, gap.missing_simple) {
                (true, true) => "technical, simple",
                (true, false) => "technical",
                _ => "simple",
            };
            let _ = writeln!(
                out,
                "### {} ({}) at line {}\nMissing: {missing}",
                element.name, element.kind, element.line
            );
            let _ = writeln!(out, "```{fence}\n{}\n```\n", context(&lines, element.line));

            template.entries.push(PayloadEntry {
                file: structure.path().to_path_buf(),
                name: element.name.clone(),
                line: Some(element.line),
                text: DocText::default(),
            });
        }
    }

    let shape = serde_json::to_string_pretty(&template).unwrap_or_default();
    let _ = writeln!(out, "## Answer format\n");
    let _ = writeln!(
        out,
        "Answer with JSON only, filling in \"technical\" and \"simple\" for every entry:\n"
    );
    let _ = writeln!(out, "```json\n{shape}\n```");
    out
}

fn context(lines: &[&str], element_line: usize) -> String {
    let at = element_line.saturating_sub(1);
    let start = at.saturating_sub(CONTEXT_BEFORE);
    let end = (at + CONTEXT_AFTER).min(lines.len());
    lines[start.min(end)..end]
        .iter()
        .map(|line| {
            let line = line.trim_end_matches('\r');
            match line.char_indices().nth(CONTEXT_LINE_LIMIT) {
                Some((cut, _)) => &line[..cut],
                None => line,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
