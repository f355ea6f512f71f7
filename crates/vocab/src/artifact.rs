use crate::literal::{escape_label, LabelPolicy};
use crate::{VocabError, Vocabulary};

pub const GENERATED_MARKER: &str =
    "// This is a generated file. Manual changes will be overwritten!!!";
/// The consumer looks the table up by this name.
pub const VOCAB_DECLARATION: &str = "const std::vector<std::string> vocab {";
pub const INCLUDES: [&str; 2] = ["#include <vector>", "#include <string>"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum IncludeGuard {
    #[default]
    PragmaOnce,
    /// `#ifndef NAME` / `#define NAME` ... `#endif`
    Macro(String),
}

impl IncludeGuard {
    fn validate(&self) -> Result<(), VocabError> {
        if let IncludeGuard::Macro(name) = self {
            let mut chars = name.chars();
            let valid_start = chars
                .next()
                .map(|c| c == '_' || c.is_ascii_alphabetic())
                .unwrap_or(false);
            if !valid_start || !chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
                return Err(VocabError::Config(format!(
                    "{name:?} is not a valid preprocessor identifier"
                )));
            }
        }
        Ok(())
    }
}

/// Turns a vocabulary into the text of a source artifact.
pub trait ArtifactRenderer {
    fn render(&self, vocab: &Vocabulary) -> Result<String, VocabError>;
}

/// Renders the vocabulary as a `const std::vector<std::string>` header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CppHeader {
    pub guard: IncludeGuard,
    pub labels: LabelPolicy,
}

impl CppHeader {
    pub fn new(guard: IncludeGuard, labels: LabelPolicy) -> Self {
        Self { guard, labels }
    }
}

impl ArtifactRenderer for CppHeader {
    fn render(&self, vocab: &Vocabulary) -> Result<String, VocabError> {
        self.guard.validate()?;

        let entries_len: usize = vocab.iter().map(|l| l.len() + 8).sum();
        let mut out = String::with_capacity(256 + entries_len);
        out.push_str(GENERATED_MARKER);
        out.push('\n');
        if let IncludeGuard::Macro(name) = &self.guard {
            out.push_str(&format!("#ifndef {name}\n#define {name}\n"));
        }
        for include in INCLUDES {
            out.push_str(include);
            out.push('\n');
        }
        if self.guard == IncludeGuard::PragmaOnce {
            out.push_str("#pragma once\n");
        }
        out.push('\n');
        out.push_str(VOCAB_DECLARATION);
        out.push('\n');
        for (index, label) in vocab.iter().enumerate() {
            let literal = escape_label(index, label, self.labels)?;
            out.push_str("\t{\"");
            out.push_str(&literal);
            out.push_str("\"},\n");
        }
        out.push_str("};");
        if matches!(self.guard, IncludeGuard::Macro(_)) {
            out.push_str("\n\n#endif\n");
        }
        Ok(out)
    }
}
