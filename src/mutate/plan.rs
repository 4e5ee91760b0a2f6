//! Position computation shared by `apply` and `preview`.

use crate::comment::{comment_runs, CommentStyle};
use crate::model::ElementKind;
use crate::synth::{CommentInsertion, ElementRef};
use std::collections::HashSet;
use std::fmt;

/// Lines scanned past the guard window to find where a comment run that
/// touches it starts and ends.
pub const BLOCK_SCAN_LIMIT: usize = 200;

/// An insertion that landed in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedInsertion {
    pub element: ElementRef,
    /// Requested line in the original text
    pub insertion_line: usize,
    /// 1-based line where the block starts in the result
    pub start_line: usize,
    pub line_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A comment block above the insertion point already names the element
    AlreadyDocumented,
    /// Another insertion in the same batch targets the same element
    DuplicateInBatch,
    /// The insertion line does not exist in the file
    OutOfRange { line_count: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyDocumented => f.write_str("already documented"),
            SkipReason::DuplicateInBatch => f.write_str("duplicate in batch"),
            SkipReason::OutOfRange { line_count } => {
                write!(f, "outside the file ({line_count} lines)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedInsertion {
    pub element: ElementRef,
    pub insertion_line: usize,
    pub reason: SkipReason,
}

#[derive(Debug)]
pub(crate) struct Plan {
    pub content: String,
    pub applied: Vec<AppliedInsertion>,
    pub skipped: Vec<SkippedInsertion>,
    pub line_count: usize,
}

impl Plan {
    pub fn out_of_range(&self) -> Option<&SkippedInsertion> {
        self.skipped
            .iter()
            .find(|s| matches!(s.reason, SkipReason::OutOfRange { .. }))
    }
}

/// Splice `insertions` into `text` bottom-up.
///
/// Each insertion goes before its 1-based line of the original text. Equal
/// lines keep their input order top to bottom. Inserted lines follow the
/// text's line ending. A leading byte order mark stays the first character
/// of the result.
pub(crate) fn plan(
    text: &str,
    insertions: &[&CommentInsertion],
    window: usize,
    style: CommentStyle,
) -> Plan {
    let (bom, text) = match text.strip_prefix('\u{feff}') {
        Some(rest) => ("\u{feff}", rest),
        None => ("", text),
    };
    let crlf = text.contains("\r\n");
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let line_count = if lines.last().is_some_and(|l| l.is_empty()) {
        lines.len() - 1
    } else {
        lines.len()
    };

    let mut ordered: Vec<(usize, &CommentInsertion)> =
        insertions.iter().copied().enumerate().collect();
    ordered.sort_by_key(|(_, ins)| ins.insertion_line);

    let mut applied: Vec<(usize, AppliedInsertion)> = Vec::new();
    let mut skipped: Vec<(usize, SkippedInsertion)> = Vec::new();
    let mut landed: HashSet<(&str, ElementKind, usize)> = HashSet::new();

    for (seq, ins) in ordered.into_iter().rev() {
        let line = ins.insertion_line;
        let key = (ins.element.name.as_str(), ins.element.kind, ins.element.line);

        let reason = if line == 0 || line > line_count + 1 {
            Some(SkipReason::OutOfRange { line_count })
        } else if landed.contains(&key) {
            Some(SkipReason::DuplicateInBatch)
        } else if already_documented(&lines, line, window, style, &ins.element.name) {
            Some(SkipReason::AlreadyDocumented)
        } else {
            None
        };

        if let Some(reason) = reason {
            skipped.push((
                seq,
                SkippedInsertion {
                    element: ins.element.clone(),
                    insertion_line: line,
                    reason,
                },
            ));
            continue;
        }

        let block: Vec<String> = ins
            .content
            .split('\n')
            .map(|l| {
                let l = l.trim_end_matches('\r');
                if crlf {
                    format!("{l}\r")
                } else {
                    l.to_string()
                }
            })
            .collect();
        let count = block.len();
        lines.splice(line - 1..line - 1, block);
        landed.insert(key);

        applied.push((
            seq,
            AppliedInsertion {
                element: ins.element.clone(),
                insertion_line: line,
                start_line: 0,
                line_count: count,
            },
        ));
    }

    applied.sort_by_key(|(seq, a)| (a.insertion_line, *seq));
    let mut shift = 0;
    for (_, a) in &mut applied {
        a.start_line = a.insertion_line + shift;
        shift += a.line_count;
    }
    skipped.sort_by_key(|(seq, _)| *seq);

    Plan {
        content: format!("{bom}{}", lines.join("\n")),
        applied: applied.into_iter().map(|(_, a)| a).collect(),
        skipped: skipped.into_iter().map(|(_, s)| s).collect(),
        line_count,
    }
}

/// Whether a comment run touching the `window` lines before `line` names
/// the element. Runs are followed past the window edges so a long block
/// is read as a whole.
fn already_documented(
    lines: &[String],
    line: usize,
    window: usize,
    style: CommentStyle,
    name: &str,
) -> bool {
    let end = (line - 1).min(lines.len());
    let start = end.saturating_sub(window);
    if start == end {
        return false;
    }

    let lo = start.saturating_sub(BLOCK_SCAN_LIMIT);
    let hi = (end + BLOCK_SCAN_LIMIT).min(lines.len());
    comment_runs(&lines[lo..hi], style)
        .into_iter()
        .map(|run| run.start + lo..run.end + lo)
        .filter(|run| run.start < end && run.end > start)
        .any(|run| lines[run].iter().any(|l| l.contains(name)))
}
