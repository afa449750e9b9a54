//! Restricted annotation vocabulary.
//!
//! Each question comes with the list of tokens a worker may use. The store
//! itself never checks tokens; editing front-ends use [`Vocabulary`] to
//! warn about or reject words outside the list.

use std::collections::HashSet;

use crate::token::Token;

/// The set of literal tokens allowed for one question.
///
/// Entries are compared after trimming, since the dataset carries
/// space-padded duplicates (`"and"`, `"and "`) for its autocomplete widget.
/// Back-references are always allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    words: HashSet<String>,
}

impl Vocabulary {
    pub fn new<I, S>(valid_tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: valid_tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Returns `true` if `token` may be used.
    pub fn allows(&self, token: &Token) -> bool {
        token.is_reference() || self.words.contains(token.label().trim())
    }

    /// Returns the tokens of `tokens` that are not allowed, in order.
    pub fn unknown<'a>(&self, tokens: &'a [Token]) -> Vec<&'a Token> {
        tokens.iter().filter(|t| !self.allows(t)).collect()
    }

    /// Returns the allowed words, sorted.
    pub fn sorted_words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.words.iter().map(String::as_str).collect();
        words.sort_unstable();
        words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
