//! Step tokens: literal words and back-references to earlier steps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::step::StepId;

/// Marker character that introduces a step back-reference (`#3`).
pub const REFERENCE_MARKER: char = '#';

/// One token of a step.
///
/// On the wire a token is a `{"label": "..."}` record. The label is parsed
/// once on ingestion: `#` followed by digits becomes a [`Token::StepReference`],
/// everything else stays a [`Token::Literal`]. Both keep the label verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawToken", into = "RawToken")]
pub enum Token {
    /// A word or symbol copied into the step text as-is.
    Literal(String),
    /// "The result of step n". `label` is the text as entered (`#01`, ` #1 `).
    StepReference { target: StepId, label: String },
}

/// Wire shape of a token as produced by editing surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToken {
    pub label: String,
}

impl Token {
    /// Parses a token label.
    pub fn parse(label: &str) -> Self {
        match parse_reference(label) {
            Some(target) => Self::StepReference {
                target,
                label: label.to_string(),
            },
            None => Self::Literal(label.to_string()),
        }
    }

    /// Creates a literal token.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Creates a back-reference to `target` with the label `#<target>`.
    pub fn reference(target: StepId) -> Self {
        Self::StepReference {
            target,
            label: format!("{REFERENCE_MARKER}{target}"),
        }
    }

    /// Returns the label this token was entered as.
    pub fn label(&self) -> &str {
        match self {
            Self::Literal(text) => text,
            Self::StepReference { label, .. } => label,
        }
    }

    /// Returns the referenced step id for back-references.
    pub fn reference_target(&self) -> Option<StepId> {
        match self {
            Self::StepReference { target, .. } => Some(*target),
            Self::Literal(_) => None,
        }
    }

    /// Returns `true` for back-references.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::StepReference { .. })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<RawToken> for Token {
    fn from(raw: RawToken) -> Self {
        Self::parse(&raw.label)
    }
}

impl From<Token> for RawToken {
    fn from(token: Token) -> Self {
        let label = match token {
            Token::Literal(text) => text,
            Token::StepReference { label, .. } => label,
        };
        Self { label }
    }
}

/// Parses a list of labels into tokens.
pub fn parse_labels<I, S>(labels: I) -> Vec<Token>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .map(|label| Token::parse(label.as_ref()))
        .collect()
}

/// Returns the target of a `#<digits>` label, ignoring surrounding whitespace.
///
/// A number too large for [`StepId`] saturates to `StepId::MAX`, which no
/// step can ever reach.
fn parse_reference(label: &str) -> Option<StepId> {
    let digits = label.trim().strip_prefix(REFERENCE_MARKER)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().unwrap_or(StepId::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_back_reference() {
        assert_eq!(Token::parse("#3"), Token::reference(3));
        assert_eq!(Token::parse(" #12 ").reference_target(), Some(12));
    }

    #[test]
    fn overflowing_reference_saturates() {
        let token = Token::parse("#99999999999999999999999");
        assert_eq!(token.reference_target(), Some(StepId::MAX));
        assert_eq!(token.label(), "#99999999999999999999999");
    }

    #[test]
    fn marker_without_digits_is_literal() {
        assert_eq!(Token::parse("#"), Token::literal("#"));
        assert_eq!(Token::parse("#a1"), Token::literal("#a1"));
        assert_eq!(Token::parse("#1a"), Token::literal("#1a"));
    }

    #[test]
    fn literal_label_is_kept_verbatim() {
        // Vocabulary entries can carry trailing spaces.
        assert_eq!(Token::parse("and "), Token::literal("and "));
        assert_eq!(Token::literal("and ").label(), "and ");
    }

    #[test]
    fn reference_label_is_kept_verbatim() {
        let token = Token::parse("#007");
        assert_eq!(token.reference_target(), Some(7));
        assert_eq!(token.label(), "#007");
        assert_eq!(Token::parse(" #1 ").label(), " #1 ");

        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r##"{"label":"#007"}"##);
        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn deserializes_from_label_record() {
        let tokens: Vec<Token> =
            serde_json::from_str(r##"[{"label":"#1"},{"label":"that"},{"label":"bark"}]"##)
                .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::reference(1),
                Token::literal("that"),
                Token::literal("bark")
            ]
        );
    }

    #[test]
    fn serializes_to_label_record() {
        let json = serde_json::to_string(&Token::reference(2)).unwrap();
        assert_eq!(json, r##"{"label":"#2"}"##);
    }

    #[test]
    fn reference_target_accessor() {
        assert_eq!(Token::reference(4).reference_target(), Some(4));
        assert_eq!(Token::literal("dogs").reference_target(), None);
        assert!(Token::reference(1).is_reference());
    }

    #[test]
    fn parse_labels_maps_each_label() {
        let tokens = parse_labels(["#1", "besides", "#2"]);
        assert_eq!(tokens.len(), 3);
        assert!(tokens[0].is_reference());
        assert!(!tokens[1].is_reference());
    }
}
