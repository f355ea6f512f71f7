use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::VocabError;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Allow,
}

/// A label that occurs more than once, with the first two positions it was seen at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Duplicate {
    pub label: String,
    pub first: usize,
    pub second: usize,
}

/// Ordered class labels. The position of a label is its class index.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Vocabulary {
    labels: Vec<String>,
}

impl Vocabulary {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Index of the first occurrence of `label`.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn into_inner(self) -> Vec<String> {
        self.labels
    }

    /// Every repeated label, in order of its second occurrence.
    pub fn duplicates(&self) -> Vec<Duplicate> {
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(self.labels.len());
        let mut out = Vec::new();
        for (index, label) in self.labels.iter().enumerate() {
            match seen.get(label.as_str()) {
                Some(&first) => out.push(Duplicate {
                    label: label.clone(),
                    first,
                    second: index,
                }),
                None => {
                    seen.insert(label.as_str(), index);
                }
            }
        }
        out
    }

    pub fn check_duplicates(&self, policy: DuplicatePolicy) -> Result<(), VocabError> {
        if policy == DuplicatePolicy::Allow {
            return Ok(());
        }
        match self.duplicates().into_iter().next() {
            Some(dup) => Err(VocabError::DuplicateLabel {
                label: dup.label,
                first: dup.first,
                second: dup.second,
            }),
            None => Ok(()),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(labels: Vec<String>) -> Self {
        Self { labels }
    }
}
