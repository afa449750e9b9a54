//! The step type -- one numbered unit of a decomposition.

use serde::{Deserialize, Serialize};

use crate::token::{Token, parse_labels};

/// 1-based position of a step in its decomposition.
pub type StepId = usize;

/// One step of a decomposition.
///
/// `value` is `None` until the worker has entered content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,

    #[serde(default)]
    pub value: Option<Vec<Token>>,
}

impl Step {
    /// Creates a step with no content yet.
    pub fn empty(id: StepId) -> Self {
        Self { id, value: None }
    }

    /// Creates a step holding `tokens`.
    pub fn new(id: StepId, tokens: Vec<Token>) -> Self {
        Self {
            id,
            value: Some(tokens),
        }
    }

    /// Creates a step by parsing each label into a token.
    pub fn from_labels<I, S>(id: StepId, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(id, parse_labels(labels))
    }

    pub fn tokens(&self) -> Option<&[Token]> {
        self.value.as_deref()
    }

    /// Returns `true` if no content has been entered.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the raw labels joined by spaces, or an empty string.
    pub fn text(&self) -> String {
        self.tokens()
            .map(|tokens| {
                tokens
                    .iter()
                    .map(Token::label)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }
}
