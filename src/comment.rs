//! Comment styles, comment-run detection and block rendering.
//!
//! Both the gap analyzer and the duplicate guard need the same answer to
//! "which of these lines belong to a comment block", so the detection lives
//! here next to the renderer that produces such blocks.

use crate::lang::Language;
use std::ops::Range;

/// How a documentation block is written in a given language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `/** ... */` with ` * ` continuation lines
    Block,
    /// consecutive `#` lines
    Hash,
}

impl CommentStyle {
    pub fn for_language(language: Option<Language>) -> Self {
        match language {
            Some(lang) if lang.uses_hash_comments() => CommentStyle::Hash,
            _ => CommentStyle::Block,
        }
    }

    fn open(self) -> &'static str {
        match self {
            CommentStyle::Block => "/**",
            CommentStyle::Hash => "#",
        }
    }

    fn body_prefix(self) -> &'static str {
        match self {
            CommentStyle::Block => " *",
            CommentStyle::Hash => "#",
        }
    }

    fn close(self) -> &'static str {
        match self {
            CommentStyle::Block => " */",
            CommentStyle::Hash => "#",
        }
    }

    /// Make externally supplied text safe to embed in this style.
    ///
    /// Line endings are normalized to `\n` and, for block comments, any
    /// `*/` that would end the comment early is broken up.
    pub fn sanitize(self, text: &str) -> String {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        match self {
            CommentStyle::Block => normalized.replace("*/", "* /"),
            CommentStyle::Hash => normalized,
        }
    }
}

/// One labeled paragraph of a documentation block.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub label: &'a str,
    pub body: &'a str,
}

/// Render a block with a header, labeled sections separated by an empty
/// comment line, and a footer. Lines are joined with `\n`, no trailing
/// newline.
pub fn render_block(style: CommentStyle, indent: &str, sections: &[Section<'_>]) -> String {
    let prefix = style.body_prefix();
    let mut lines = vec![format!("{indent}{}", style.open())];

    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            lines.push(format!("{indent}{prefix}"));
        }
        lines.push(format!("{indent}{prefix} {}:", section.label));
        let body = style.sanitize(section.body);
        for line in body.trim().lines() {
            let line = line.trim_end();
            if line.is_empty() {
                lines.push(format!("{indent}{prefix}"));
            } else {
                lines.push(format!("{indent}{prefix} {line}"));
            }
        }
    }

    lines.push(format!("{indent}{}", style.close()));
    lines.join("\n")
}

/// Index ranges of consecutive comment lines in `lines`.
///
/// For block style a line counts when it opens a `/*`, starts with `*`
/// (continuation or closer), or lies inside an unterminated `/* ... */`.
/// For hash style a line counts when it starts with `#`.
pub fn comment_runs<S: AsRef<str>>(lines: &[S], style: CommentStyle) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut in_block = false;
    let mut run_start: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        let is_comment = match style {
            CommentStyle::Block => block_comment_line(line.as_ref(), &mut in_block),
            CommentStyle::Hash => line.as_ref().trim_start().starts_with('#'),
        };
        match (is_comment, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                runs.push(start..i);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        runs.push(start..lines.len());
    }
    runs
}

fn block_comment_line(line: &str, in_block: &mut bool) -> bool {
    let trimmed = line.trim_start();
    let mut is_comment = *in_block || trimmed.starts_with("/*") || trimmed.starts_with('*');

    let mut rest = line;
    loop {
        if *in_block {
            match rest.find("*/") {
                Some(pos) => {
                    *in_block = false;
                    rest = &rest[pos + 2..];
                }
                None => break,
            }
        } else {
            match rest.find("/*") {
                Some(pos) => {
                    *in_block = true;
                    is_comment = true;
                    rest = &rest[pos + 2..];
                }
                None => break,
            }
        }
    }
    is_comment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_block_layout() {
        let block = render_block(
            CommentStyle::Block,
            "",
            &[
                Section {
                    label: "Technical Explanation",
                    body: "Adds two numbers.",
                },
                Section {
                    label: "Simple Explanation",
                    body: "Like a calculator.",
                },
            ],
        );
        assert_eq!(
            block,
            "/**\n * Technical Explanation:\n * Adds two numbers.\n *\n * Simple Explanation:\n * Like a calculator.\n */"
        );
    }

    #[test]
    fn renders_hash_layout_with_indent() {
        let block = render_block(
            CommentStyle::Hash,
            "    ",
            &[Section {
                label: "Technical Explanation",
                body: "Line one\n\nLine two",
            }],
        );
        assert_eq!(
            block,
            "    #\n    # Technical Explanation:\n    # Line one\n    #\n    # Line two\n    #"
        );
    }

    #[test]
    fn sanitize_breaks_comment_terminator() {
        let block = render_block(
            CommentStyle::Block,
            "",
            &[Section {
                label: "Technical Explanation",
                body: "ends early */ evil();\r\nnext",
            }],
        );
        assert!(!block[..block.len() - 3].contains("*/"));
        assert!(block.contains("* / evil();"));
        assert!(!block.contains('\r'));
    }

    #[test]
    fn finds_block_runs() {
        let lines = [
            "const x = 1;",
            "/**",
            " * Docs",
            " */",
            "function f() {}",
            "/* inline */ let y;",
            "",
        ];
        assert_eq!(comment_runs(&lines, CommentStyle::Block), vec![1..4, 5..6]);
    }

    #[test]
    fn unterminated_block_runs_to_end() {
        let lines = ["code", "/* start", "still inside", "more"];
        assert_eq!(comment_runs(&lines, CommentStyle::Block), vec![1..4]);
    }

    #[test]
    fn finds_hash_runs() {
        let lines = ["# a", "# b", "def f():", "    # c"];
        assert_eq!(comment_runs(&lines, CommentStyle::Hash), vec![0..2, 3..4]);
    }

    #[test]
    fn style_follows_language() {
        assert_eq!(
            CommentStyle::for_language(Some(Language::Python)),
            CommentStyle::Hash
        );
        assert_eq!(
            CommentStyle::for_language(Some(Language::Go)),
            CommentStyle::Block
        );
        assert_eq!(CommentStyle::for_language(None), CommentStyle::Block);
    }
}
