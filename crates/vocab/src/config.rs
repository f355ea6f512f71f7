use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::artifact::{CppHeader, IncludeGuard};
use crate::layout::{ProjectLayout, DEFAULT_ARTIFACT, DEFAULT_CPP_SOURCE_DIR};
use crate::literal::LabelPolicy;
use crate::vocabulary::DuplicatePolicy;
use crate::writer::VocabArtifactWriter;
use crate::VocabError;

/// Settings for header generation, usually read from a YAML file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub repo_root: PathBuf,
    /// Native source directory, relative to `repo_root` unless absolute.
    pub cpp_source_dir: PathBuf,
    /// Artifact path relative to the native source directory.
    pub artifact: PathBuf,
    pub duplicates: DuplicatePolicy,
    pub labels: LabelPolicy,
    /// Emit an `#ifndef` guard with this name instead of `#pragma once`.
    pub guard_macro: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            cpp_source_dir: PathBuf::from(DEFAULT_CPP_SOURCE_DIR),
            artifact: PathBuf::from(DEFAULT_ARTIFACT),
            duplicates: DuplicatePolicy::default(),
            labels: LabelPolicy::default(),
            guard_macro: None,
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, VocabError> {
        let text = fs::read_to_string(path).map_err(|err| VocabError::io(path, err))?;
        serde_yaml::from_str(&text)
            .map_err(|err| VocabError::Config(format!("{}: {err}", path.display())))
    }

    pub fn from_yaml(text: &str) -> Result<Self, VocabError> {
        serde_yaml::from_str(text).map_err(|err| VocabError::Config(err.to_string()))
    }

    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(&self.repo_root).with_cpp_source_dir(&self.cpp_source_dir)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.layout().cpp_source_dir().join(&self.artifact)
    }

    pub fn renderer(&self) -> CppHeader {
        let guard = match &self.guard_macro {
            Some(name) => IncludeGuard::Macro(name.clone()),
            None => IncludeGuard::PragmaOnce,
        };
        CppHeader::new(guard, self.labels)
    }

    pub fn writer(&self) -> VocabArtifactWriter {
        VocabArtifactWriter::with_renderer(self.artifact_path(), self.renderer())
            .duplicates(self.duplicates)
    }
}
