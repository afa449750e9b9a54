//! Questions and question ids.
//!
//! Question ids follow the dataset naming scheme
//! `<SOURCE>_<split>_<rest>` (`SPIDER_train_3983`) or, for sources with a
//! sub-collection, `<SOURCE>_<split>_<collection>_<n>_<hash>`
//! (`DROP_dev_history_69_6ebee2d1-4f22`). Granular ids carry an extra `LOW_`
//! prefix that is dropped before lookup.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix marking a granular (low-level) question id.
pub const GRANULAR_PREFIX: &str = "LOW_";

static SIMPLE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z2]+_[a-z]+_[A-Za-z0-9_-]+$").expect("valid question id pattern")
});

static COLLECTION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]+_[a-z]+_[a-z]+_[0-9]+_[A-Za-z0-9-]+$").expect("valid question id pattern")
});

/// Error for a malformed question id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid question id '{0}'")]
pub struct InvalidQuestionId(pub String);

/// A validated question id, as used for dataset lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct QuestionId {
    id: String,
    granular: bool,
}

impl QuestionId {
    /// Validates `input` (surrounding whitespace ignored).
    ///
    /// The granular prefix is stripped only when what follows is itself a
    /// valid id; otherwise the whole input is matched as given, so
    /// `LOW_dev_x` is a plain id.
    pub fn parse(input: &str) -> Result<Self, InvalidQuestionId> {
        let trimmed = input.trim();
        if let Some(rest) = trimmed.strip_prefix(GRANULAR_PREFIX) {
            if is_valid_id(rest) {
                return Ok(Self {
                    id: rest.to_string(),
                    granular: true,
                });
            }
        }

        if is_valid_id(trimmed) {
            Ok(Self {
                id: trimmed.to_string(),
                granular: false,
            })
        } else {
            Err(InvalidQuestionId(trimmed.to_string()))
        }
    }

    /// The lookup key (without any granular prefix).
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Returns `true` if the id was entered with the `LOW_` prefix.
    pub fn is_granular(&self) -> bool {
        self.granular
    }

    /// The dataset the question comes from (`SPIDER`, `DROP`, ...).
    pub fn source(&self) -> &str {
        self.id.split('_').next().unwrap_or_default()
    }
}

fn is_valid_id(id: &str) -> bool {
    SIMPLE_ID.is_match(id) || COLLECTION_ID.is_match(id)
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl FromStr for QuestionId {
    type Err = InvalidQuestionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<QuestionId> for String {
    fn from(id: QuestionId) -> Self {
        id.id
    }
}

/// A question record from the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The natural-language question.
    pub text: String,

    /// Tokens the worker may use when writing steps.
    #[serde(default)]
    pub valid_tokens: Vec<String>,
}

impl Question {
    pub fn new(text: impl Into<String>, valid_tokens: Vec<String>) -> Self {
        Self {
            text: text.into(),
            valid_tokens,
        }
    }
}
