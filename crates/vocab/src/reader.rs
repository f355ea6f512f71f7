//! Reads a generated header back into its entries.
//!
//! Only the layout produced by [`CppHeader`](crate::CppHeader) is accepted; a
//! hand-edited file is reported as malformed rather than guessed at.

use std::fs;
use std::path::Path;

use crate::artifact::{GENERATED_MARKER, INCLUDES, VOCAB_DECLARATION};
use crate::literal::unescape_literal;
use crate::{VocabError, Vocabulary};

const ENTRY_PREFIX: &str = "\t{\"";
const ENTRY_SUFFIX: &str = "\"},";
const CLOSING: &str = "};";

pub fn parse_artifact(text: &str) -> Result<Vec<String>, VocabError> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    match lines.next() {
        Some((_, first)) if first == GENERATED_MARKER => {}
        _ => return Err(VocabError::malformed(1, "missing generated-file marker")),
    }

    let mut macro_guard: Option<&str> = None;
    let mut last_line = 1;
    let mut found_declaration = false;
    for (number, line) in lines.by_ref() {
        last_line = number;
        if line == VOCAB_DECLARATION {
            found_declaration = true;
            break;
        }
        if line.is_empty() || line == "#pragma once" || INCLUDES.contains(&line) {
            continue;
        }
        if let Some(name) = line.strip_prefix("#ifndef ") {
            macro_guard = Some(name);
            continue;
        }
        match (line.strip_prefix("#define "), macro_guard) {
            (Some(name), Some(guard)) if name == guard => continue,
            _ => {
                return Err(VocabError::malformed(
                    number,
                    format!("unexpected line before declaration: {line:?}"),
                ))
            }
        }
    }
    if !found_declaration {
        return Err(VocabError::malformed(last_line, "missing vocab declaration"));
    }

    let mut entries = Vec::new();
    let mut closed = false;
    for (number, line) in lines.by_ref() {
        last_line = number;
        if line == CLOSING {
            closed = true;
            break;
        }
        let body = line
            .strip_prefix(ENTRY_PREFIX)
            .and_then(|rest| rest.strip_suffix(ENTRY_SUFFIX))
            .ok_or_else(|| VocabError::malformed(number, format!("not a vocab entry: {line:?}")))?;
        entries.push(unescape_literal(body, number)?);
    }
    if !closed {
        return Err(VocabError::malformed(last_line, "missing closing `};`"));
    }

    let mut guard_closed = macro_guard.is_none();
    for (number, line) in lines {
        match line {
            "" => {}
            "#endif" if macro_guard.is_some() && !guard_closed => guard_closed = true,
            _ => {
                return Err(VocabError::malformed(
                    number,
                    format!("unexpected trailing content: {line:?}"),
                ))
            }
        }
        last_line = number;
    }
    if !guard_closed {
        return Err(VocabError::malformed(last_line, "missing #endif for include guard"));
    }

    Ok(entries)
}

pub fn read_artifact(path: &Path) -> Result<Vocabulary, VocabError> {
    let text = fs::read_to_string(path).map_err(|err| VocabError::io(path, err))?;
    parse_artifact(&text).map(Vocabulary::from)
}
