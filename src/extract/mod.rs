//! Structural extraction: text in, flat element lists out.
//!
//! No syntax tree is built. Each language owns an ordered list of bounded
//! pattern rules (see [`rules`]); raw captures are validated against the
//! category grammar (see [`grammar`]) and positioned with a precomputed
//! [`LineIndex`], so resolving every element of a file costs one pass over
//! the text plus a binary search per element.

pub mod errors;
pub mod grammar;
pub(crate) mod rules;
pub mod signature;

pub use errors::ExtractError;

use crate::lang::Language;
use crate::model::{CodeStructure, ElementKind, LineIndex, StructuralElement};
use rules::{rules_for, Capture, Rule};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Bytes inspected by the binary heuristic.
const BINARY_SNIFF_LEN: usize = 8000;

/// Read `path` and extract its structure.
///
/// Unknown extensions give an empty structure. Content that decodes as UTF-8
/// but looks binary (a NUL byte near the start) also gives an empty
/// structure; content that does not decode is an error.
pub fn extract_file(path: impl AsRef<Path>) -> Result<CodeStructure, ExtractError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let Some(language) = Language::from_path(path) else {
        debug!(path = %path.display(), "no language for extension, skipping extraction");
        let text = String::from_utf8_lossy(&bytes).into_owned();
        return Ok(CodeStructure::empty(path, None, text));
    };

    let text = String::from_utf8(bytes).map_err(|source| ExtractError::Undecodable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(extract_source(path, language, text))
}

/// Extract from an already decoded snapshot.
pub fn extract_source(path: impl Into<PathBuf>, language: Language, text: String) -> CodeStructure {
    let path = path.into();
    if looks_binary(&text) {
        debug!(path = %path.display(), "content looks binary, skipping extraction");
        return CodeStructure::empty(path, Some(language), text);
    }

    let mut structure = CodeStructure::empty(path, Some(language), String::new());
    let index = LineIndex::new(&text);
    let mut seen: HashSet<(ElementKind, String, usize)> = HashSet::new();
    let mut rejected = 0usize;

    for rule in rules_for(language) {
        for caps in rule.regex.captures_iter(&text) {
            for (candidate, offset) in candidates(rule, &caps) {
                if rule.rejects(candidate) || !grammar::accepts(rule.kind, candidate) {
                    trace!(candidate, kind = %rule.kind, "rejected candidate");
                    rejected += 1;
                    continue;
                }

                if commented_out(&text[index.line_start(offset)..offset], language) {
                    trace!(candidate, kind = %rule.kind, "candidate inside a comment line");
                    rejected += 1;
                    continue;
                }

                let line = index.line_of(offset);
                if !seen.insert((rule.kind, candidate.to_string(), line)) {
                    continue;
                }

                let element = build_element(
                    rule.kind,
                    candidate,
                    offset,
                    line,
                    &index,
                    &text,
                    language,
                );
                structure.elements_mut(rule.kind).push(element);
            }
        }
    }

    for kind in [
        ElementKind::Function,
        ElementKind::Class,
        ElementKind::Import,
        ElementKind::Export,
    ] {
        structure.elements_mut(kind).sort_by_key(|e| e.offset);
    }

    debug!(
        path = %structure.path().display(),
        language = %language,
        functions = structure.functions.len(),
        classes = structure.classes.len(),
        imports = structure.imports.len(),
        exports = structure.exports.len(),
        rejected,
        "extracted structure"
    );

    structure.set_text(text);
    structure
}

#[allow(clippy::too_many_arguments)]
fn build_element(
    kind: ElementKind,
    name: &str,
    offset: usize,
    line: usize,
    index: &LineIndex,
    text: &str,
    language: Language,
) -> StructuralElement {
    let line_start = index.line_start(offset);
    let indent: String = text[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();

    let signature = match kind {
        ElementKind::Function | ElementKind::Class => {
            signature::extract_signature(text, offset, language)
        }
        ElementKind::Import | ElementKind::Export => None,
    };

    StructuralElement {
        name: name.to_string(),
        kind,
        line,
        offset,
        signature,
        import_path: (kind == ElementKind::Import).then(|| name.to_string()),
        indent,
    }
}

/// Raw `(candidate, byte offset)` pairs produced by one match.
///
/// The offset is where the element's line is taken from: the match start for
/// single captures, the item itself for list captures.
fn candidates<'t>(rule: &Rule, caps: &regex::Captures<'t>) -> Vec<(&'t str, usize)> {
    let start = caps.get(0).map_or(0, |m| m.start());
    match rule.capture {
        Capture::Name => caps
            .name("name")
            .map(|m| vec![(m.as_str(), start)])
            .unwrap_or_default(),
        Capture::Path => caps
            .name("path")
            .map(|m| vec![(m.as_str(), start)])
            .unwrap_or_default(),
        Capture::NameList => caps
            .name("list")
            .map(|m| split_name_list(m.as_str(), m.start()))
            .unwrap_or_default(),
        Capture::QuotedPaths => caps
            .name("list")
            .map(|m| split_quoted_paths(m.as_str(), m.start()))
            .unwrap_or_default(),
    }
}

/// `a, b as c, type D` -> `a`, `c`, `D` with their absolute offsets.
/// Comments inside the braces are ignored, commas in them included.
fn split_name_list(list: &str, base: usize) -> Vec<(&str, usize)> {
    let masked = mask_comments(list);
    let mut out = Vec::new();
    let mut seg_start = 0;
    for segment in masked.split(',') {
        let seg_offset = seg_start;
        seg_start += segment.len() + 1;

        let mut item = segment.trim_start();
        let mut lead = segment.len() - item.len();
        if let Some(rest) = item.strip_prefix("type ") {
            let rest_trimmed = rest.trim_start();
            lead += item.len() - rest_trimmed.len();
            item = rest_trimmed;
        }
        let item = item.trim_end();

        let (len, name_pos) = match item.rfind(" as ") {
            Some(pos) => {
                let after = &item[pos + 4..];
                let trimmed = after.trim_start();
                (trimmed.len(), lead + pos + 4 + (after.len() - trimmed.len()))
            }
            None => (item.len(), lead),
        };
        if len > 0 {
            let at = seg_offset + name_pos;
            out.push((&list[at..at + len], base + at));
        }
    }
    out
}

/// Same length as `list`, with `//` and `/* */` comments blanked to spaces.
/// Newlines survive so offsets still map to the right line.
fn mask_comments(list: &str) -> String {
    let mut out = String::with_capacity(list.len());
    let mut chars = list.chars().peekable();
    while let Some(c) = chars.next() {
        let next = chars.peek().copied();
        match (c, next) {
            ('/', Some('/')) => {
                out.push_str("  ");
                chars.next();
                while let Some(&n) = chars.peek() {
                    if n == '\n' {
                        break;
                    }
                    blank(&mut out, n);
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                out.push_str("  ");
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    blank(&mut out, n);
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn blank(out: &mut String, c: char) {
    if c == '\n' {
        out.push('\n');
    } else {
        out.extend(std::iter::repeat(' ').take(c.len_utf8()));
    }
}

/// Every `"..."` on its own within an import block.
fn split_quoted_paths(list: &str, base: usize) -> Vec<(&str, usize)> {
    let mut out = Vec::new();
    let mut line_offset = 0;
    for line in list.split('\n') {
        if let Some(open) = line.find('"') {
            if let Some(len) = line[open + 1..].find('"') {
                let path = &line[open + 1..open + 1 + len];
                out.push((path, base + line_offset + open + 1));
            }
        }
        line_offset += line.len() + 1;
    }
    out
}

/// True when the text between a line's start and a match begins with a line
/// comment leader, as in a documentation block quoting a signature.
fn commented_out(line_prefix: &str, language: Language) -> bool {
    let prefix = line_prefix.trim_start();
    let leaders: &[&str] = match language {
        Language::Python | Language::Ruby => &["#"],
        Language::Php => &["//", "/*", "*", "#"],
        _ => &["//", "/*", "*"],
    };
    leaders.iter().any(|leader| prefix.starts_with(leader))
}

fn looks_binary(text: &str) -> bool {
    let sniff = &text.as_bytes()[..text.len().min(BINARY_SNIFF_LEN)];
    sniff.contains(&0)
}
