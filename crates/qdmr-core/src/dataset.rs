//! Question dataset lookup.
//!
//! The dataset is a static JSON object keyed by question id:
//!
//! ```json
//! { "SPIDER_train_1": { "text": "How many dogs?", "valid_tokens": ["dogs", "#1"] } }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::question::{Question, QuestionId};

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("dataset {path} is not a valid question store: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result alias for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Anything that can map a question id to a question record.
pub trait QuestionLookup {
    /// Returns the question, or `None` if the id is unknown.
    fn lookup(&self, id: &QuestionId) -> Option<&Question>;
}

/// In-memory question dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionStore {
    questions: BTreeMap<String, Question>,
}

impl QuestionStore {
    /// Loads a dataset from a JSON file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_reader(BufReader::new(file)).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        info!(?path, questions = store.len(), "loaded question dataset");
        Ok(store)
    }

    /// Parses a dataset from any JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        let questions: BTreeMap<String, Question> = serde_json::from_reader(reader)?;
        Ok(Self { questions })
    }

    /// Builds a dataset from `(id, question)` pairs.
    pub fn from_questions<I, S>(questions: I) -> Self
    where
        I: IntoIterator<Item = (S, Question)>,
        S: Into<String>,
    {
        Self {
            questions: questions
                .into_iter()
                .map(|(id, q)| (id.into(), q))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Iterates over `(id, question)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Question)> {
        self.questions.iter().map(|(id, q)| (id.as_str(), q))
    }
}

impl QuestionLookup for QuestionStore {
    fn lookup(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.get(id.as_str())
    }
}
