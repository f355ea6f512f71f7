use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VocabError {
    #[error("target directory does not exist: {0}")]
    MissingDirectory(PathBuf),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("label #{index} {label:?} contains unsupported character {character:?}")]
    Encoding {
        index: usize,
        label: String,
        character: char,
    },
    #[error("duplicate label {label:?} at indices {first} and {second}")]
    DuplicateLabel {
        label: String,
        first: usize,
        second: usize,
    },
    #[error("malformed artifact at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("no parameter file found at {0}")]
    ParamsNotFound(PathBuf),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VocabError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed<T: Into<String>>(line: usize, reason: T) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }
}
