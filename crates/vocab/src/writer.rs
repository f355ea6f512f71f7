use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::artifact::{ArtifactRenderer, CppHeader};
use crate::layout::DEFAULT_ARTIFACT;
use crate::vocabulary::DuplicatePolicy;
use crate::{VocabError, Vocabulary};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactReport {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: usize,
}

/// Writes the vocabulary header to a fixed target path.
///
/// The file is staged next to the target and renamed over it, so readers see
/// either the previous artifact or the complete new one. The staging file is
/// removed on every failure path.
#[derive(Clone, Debug)]
pub struct VocabArtifactWriter<R = CppHeader> {
    target: PathBuf,
    renderer: R,
    duplicates: DuplicatePolicy,
}

impl VocabArtifactWriter<CppHeader> {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self::with_renderer(target, CppHeader::default())
    }

    /// Writer for `<source_dir>/src/vocab-gen.h`.
    pub fn for_source_dir(source_dir: impl AsRef<Path>) -> Self {
        Self::new(source_dir.as_ref().join(DEFAULT_ARTIFACT))
    }
}

impl<R: ArtifactRenderer> VocabArtifactWriter<R> {
    pub fn with_renderer(target: impl Into<PathBuf>, renderer: R) -> Self {
        Self {
            target: target.into(),
            renderer,
            duplicates: DuplicatePolicy::default(),
        }
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Validate and render without touching the filesystem.
    pub fn render(&self, vocab: &Vocabulary) -> Result<String, VocabError> {
        vocab.check_duplicates(self.duplicates)?;
        if self.duplicates == DuplicatePolicy::Allow {
            let dups = vocab.duplicates();
            if !dups.is_empty() {
                warn!(
                    count = dups.len(),
                    first = %dups[0].label,
                    "vocabulary contains duplicate labels"
                );
            }
        }
        self.renderer.render(vocab)
    }

    #[instrument(skip(self, vocab), fields(target = %self.target.display(), entries = vocab.len()))]
    pub fn write(&self, vocab: &Vocabulary) -> Result<ArtifactReport, VocabError> {
        let contents = self.render(vocab)?;
        let dir = self.target_dir();
        if !dir.is_dir() {
            return Err(VocabError::MissingDirectory(dir.to_path_buf()));
        }

        let permissions = published_permissions(&self.target);
        let mut staging = tempfile::Builder::new()
            .prefix(".vocab-gen.")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|err| VocabError::io(dir, err))?;
        debug!(staging = %staging.path().display(), "staging artifact");

        staging
            .write_all(contents.as_bytes())
            .and_then(|_| staging.as_file().sync_all())
            .map_err(|err| VocabError::io(staging.path(), err))?;
        if let Some(permissions) = permissions {
            staging
                .as_file()
                .set_permissions(permissions)
                .map_err(|err| VocabError::io(staging.path(), err))?;
        }
        staging
            .persist(&self.target)
            .map_err(|err| VocabError::io(&self.target, err.error))?;

        info!(
            path = %self.target.display(),
            entries = vocab.len(),
            bytes = contents.len(),
            "wrote vocab artifact"
        );
        Ok(ArtifactReport {
            path: self.target.clone(),
            entries: vocab.len(),
            bytes: contents.len(),
        })
    }

    /// Whether the artifact on disk is exactly what `write` would produce.
    pub fn is_current(&self, vocab: &Vocabulary) -> Result<bool, VocabError> {
        let expected = self.render(vocab)?;
        match fs::read(&self.target) {
            Ok(existing) => Ok(existing == expected.as_bytes()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(VocabError::io(&self.target, err)),
        }
    }

    fn target_dir(&self) -> &Path {
        match self.target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// Staging files are created owner-only; the artifact keeps the mode of the file
/// it replaces, or gets the usual source-file mode.
fn published_permissions(target: &Path) -> Option<fs::Permissions> {
    if let Ok(metadata) = fs::metadata(target) {
        return Some(metadata.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}
