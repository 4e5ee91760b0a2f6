//! Signature slicing: match start up to the language's block opener.

use crate::lang::Language;

/// Upper bound on how far past the match start the opener is searched for.
///
/// Without it a file with many openerless matches would rescan the same tail
/// once per element.
pub const SIGNATURE_SCAN_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    /// `{` outside quotes
    Brace,
    /// `:` outside quotes and brackets (Python)
    Colon,
    /// end of line outside brackets (Ruby)
    LineEnd,
}

fn opener_for(lang: Language) -> Opener {
    match lang {
        Language::Python => Opener::Colon,
        Language::Ruby => Opener::LineEnd,
        _ => Opener::Brace,
    }
}

/// Characters that open a string literal. Rust lifetimes (`'a`) rule out
/// the single quote there.
fn is_quote(lang: Language, c: char) -> bool {
    match c {
        '"' => true,
        '\'' => lang != Language::Rust,
        '`' => matches!(lang, Language::JavaScript | Language::TypeScript | Language::Go),
        _ => false,
    }
}

/// Signature starting at byte `start` of `text`, trimmed.
///
/// Returns `None` when the slice is empty after trimming.
pub fn extract_signature(text: &str, start: usize, lang: Language) -> Option<String> {
    let tail = text.get(start..)?;
    let opener = opener_for(lang);

    let mut end = tail.len();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;

    for (i, c) in tail.char_indices() {
        if i >= SIGNATURE_SCAN_LIMIT {
            end = i;
            break;
        }
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }
        if let Some(open) = quote {
            if c == open {
                quote = None;
            } else if c == '\n' && open != '`' {
                // unterminated literal; give up on it at the line end
                quote = None;
            }
            continue;
        }
        if is_quote(lang, c) {
            quote = Some(c);
            continue;
        }
        match (opener, c) {
            (Opener::Brace, '{') => {
                end = i;
                break;
            }
            (Opener::Colon | Opener::LineEnd, '(' | '[' | '{') => depth += 1,
            (Opener::Colon | Opener::LineEnd, ')' | ']' | '}') => depth = depth.saturating_sub(1),
            (Opener::Colon, ':') if depth == 0 => {
                end = i;
                break;
            }
            (Opener::LineEnd, '\n' | ';') if depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    let signature = tail[..end].trim();
    (!signature.is_empty()).then(|| signature.to_string())
}
