//! C++ narrow string literal escaping.
//!
//! The consumer initialises `std::string` from the literal, so the text between
//! the quotes has to survive the C++ lexer unchanged: quotes and backslashes are
//! escaped, control characters use bounded octal escapes (hex escapes in C++ are
//! greedy), and `??` is broken up so no trigraph can form on older compilers.

use serde::{Deserialize, Serialize};

use crate::VocabError;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Escape anything the literal syntax cannot carry verbatim.
    #[default]
    Escape,
    /// Refuse labels that would need any escaping.
    Reject,
}

fn needs_escape(c: char) -> bool {
    matches!(c, '"' | '\\') || c.is_ascii_control()
}

/// Escape `label` (the `index`-th vocabulary entry) for use between double quotes.
pub fn escape_label(index: usize, label: &str, policy: LabelPolicy) -> Result<String, VocabError> {
    let encoding_error = |character| VocabError::Encoding {
        index,
        label: label.to_string(),
        character,
    };

    let mut out = String::with_capacity(label.len());
    let mut prev = None;
    for c in label.chars() {
        // an embedded NUL would truncate the std::string on the consumer side
        if c == '\0' {
            return Err(encoding_error(c));
        }
        let trigraph = c == '?' && prev == Some('?');
        if policy == LabelPolicy::Reject && (needs_escape(c) || trigraph) {
            return Err(encoding_error(c));
        }
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '?' if trigraph => out.push_str("\\?"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
        prev = Some(c);
    }
    Ok(out)
}

/// Inverse of [`escape_label`]. `body` is the text between the quotes and `line`
/// is only used for error reporting.
pub fn unescape_literal(body: &str, line: usize) -> Result<String, VocabError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| VocabError::malformed(line, "dangling backslash in literal"))?;
                match escaped {
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    '\'' => out.push('\''),
                    '?' => out.push('?'),
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0'..='7' => {
                        let mut value = escaped.to_digit(8).unwrap_or(0);
                        for _ in 0..2 {
                            match chars.peek().and_then(|d| d.to_digit(8)) {
                                Some(digit) => {
                                    value = value * 8 + digit;
                                    chars.next();
                                }
                                None => break,
                            }
                        }
                        let decoded = char::from_u32(value)
                            .filter(|c| *c != '\0' && c.is_ascii())
                            .ok_or_else(|| {
                                VocabError::malformed(
                                    line,
                                    format!("octal escape \\{value:o} is not a supported character"),
                                )
                            })?;
                        out.push(decoded);
                    }
                    other => {
                        return Err(VocabError::malformed(
                            line,
                            format!("unsupported escape sequence \\{other}"),
                        ))
                    }
                }
            }
            '"' => {
                return Err(VocabError::malformed(line, "unescaped quote inside literal"));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}
