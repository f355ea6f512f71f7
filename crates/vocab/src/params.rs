use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{VocabError, Vocabulary};

/// Training parameter dictionary stored as a JSON object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    values: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, VocabError> {
        if !path.is_file() {
            return Err(VocabError::ParamsNotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|err| VocabError::io(path, err))?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| VocabError::Serialization(format!("{}: {err}", path.display())))?;
        match value {
            Value::Object(values) => {
                debug!(path = %path.display(), keys = values.len(), "loaded params");
                Ok(Self { values })
            }
            other => Err(VocabError::Serialization(format!(
                "{}: expected a JSON object, found {}",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    /// Write the dictionary, replacing the file. The parent directory must exist.
    pub fn save(&self, path: &Path) -> Result<(), VocabError> {
        let file = File::create(path).map_err(|err| VocabError::io(path, err))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.values)
            .map_err(|err| VocabError::Serialization(err.to_string()))?;
        writer.flush().map_err(|err| VocabError::io(path, err))?;
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, VocabError> {
        self.values
            .get(key)
            .map(|value| {
                T::deserialize(value)
                    .map_err(|err| VocabError::Serialization(format!("param {key:?}: {err}")))
            })
            .transpose()
    }

    pub fn set<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<(), VocabError> {
        let value =
            serde_json::to_value(value).map_err(|err| VocabError::Serialization(err.to_string()))?;
        self.values.insert(key.into(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The vocabulary stored under `key`; a missing key is an error.
    pub fn vocab(&self, key: &str) -> Result<Vocabulary, VocabError> {
        self.get::<Vocabulary>(key)?
            .ok_or_else(|| VocabError::Serialization(format!("no {key:?} entry in params")))
    }
}

/// Read a vocabulary from a JSON array file.
pub fn load_vocab_json(path: &Path) -> Result<Vocabulary, VocabError> {
    let text = fs::read_to_string(path).map_err(|err| VocabError::io(path, err))?;
    serde_json::from_str(&text)
        .map_err(|err| VocabError::Serialization(format!("{}: {err}", path.display())))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
