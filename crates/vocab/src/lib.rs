//! Class vocabulary handling and generation of the `vocab-gen.h` header that the
//! native ESC inference app compiles in.

pub mod artifact;
pub mod config;
pub mod error;
pub mod layout;
pub mod literal;
pub mod params;
pub mod reader;
pub mod vocabulary;
pub mod writer;

pub use crate::artifact::{ArtifactRenderer, CppHeader, IncludeGuard};
pub use crate::config::GeneratorConfig;
pub use crate::error::VocabError;
pub use crate::layout::ProjectLayout;
pub use crate::literal::LabelPolicy;
pub use crate::params::{load_vocab_json, Params};
pub use crate::reader::{parse_artifact, read_artifact};
pub use crate::vocabulary::{Duplicate, DuplicatePolicy, Vocabulary};
pub use crate::writer::{ArtifactReport, VocabArtifactWriter};
