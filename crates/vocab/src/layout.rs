use std::path::{Path, PathBuf};

pub const DEFAULT_CPP_SOURCE_DIR: &str = "inference-cpp";
pub const DEFAULT_ARTIFACT: &str = "src/vocab-gen.h";

/// Directory layout of the research repository.
///
/// Every path is derived from an explicit root so tools and tests can point the
/// layout at a scratch directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    cpp_source_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let cpp_source_dir = root.join(DEFAULT_CPP_SOURCE_DIR);
        Self {
            root,
            cpp_source_dir,
        }
    }

    /// Override the native source directory; relative paths resolve against the root.
    pub fn with_cpp_source_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cpp_source_dir = self.root.join(dir);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn train_dir(&self) -> PathBuf {
        self.root.join("train")
    }

    pub fn test_dir(&self) -> PathBuf {
        self.root.join("test")
    }

    pub fn model_dir(&self) -> PathBuf {
        self.train_dir().join("models")
    }

    pub fn dataset_root(&self) -> PathBuf {
        self.train_dir().join("dataset").join("ESC-50")
    }

    pub fn params_file(&self) -> PathBuf {
        self.train_dir().join("params.json")
    }

    pub fn cpp_source_dir(&self) -> &Path {
        &self.cpp_source_dir
    }

    pub fn cpp_build_dir(&self) -> PathBuf {
        self.cpp_source_dir.join("build")
    }

    pub fn vocab_artifact(&self) -> PathBuf {
        self.cpp_source_dir.join(DEFAULT_ARTIFACT)
    }
}
