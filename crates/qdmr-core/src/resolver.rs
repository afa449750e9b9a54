//! Step reference resolution.
//!
//! Turns a step's tokens into two strings:
//!
//! - the **display string**, where every back-reference `#r` is replaced by
//!   the already-resolved display string of step `r`;
//! - the **annotation string**, `"return <tokens>"` with references left raw.
//!
//! Steps must be resolved in increasing id order: step `k` can only see the
//! display strings of steps `1..k`. Forward and self references can never be
//! resolved and render as [`INVALID_REFERENCE`] instead of failing.

use serde::Serialize;

use crate::step::{Step, StepId};
use crate::token::Token;

/// Display text substituted for a reference that cannot be resolved.
pub const INVALID_REFERENCE: &str = "<ERROR - invalid step reference!>";

/// Prefix of every annotation string.
pub const ANNOTATION_PREFIX: &str = "return ";

/// The two renderings of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStep {
    /// Human-readable text with references substituted.
    pub display: String,
    /// Machine form, `"return "` followed by each raw token and a space.
    pub annotation: String,
}

/// Resolves one step.
///
/// `prior` holds the display strings of steps `1..step_id` in order; a `None`
/// entry marks a step that has no content and therefore cannot be referenced.
pub fn resolve_step(step_id: StepId, tokens: &[Token], prior: &[Option<String>]) -> ResolvedStep {
    let mut display = String::new();
    let mut annotation = String::from(ANNOTATION_PREFIX);

    for token in tokens {
        match token {
            Token::Literal(text) => {
                annotation.push_str(text);
                display.push_str(text);
            }
            Token::StepReference { target, label } => {
                annotation.push_str(label);
                display.push_str(prior_display(step_id, *target, prior).unwrap_or(INVALID_REFERENCE));
            }
        }
        annotation.push(' ');
        display.push(' ');
    }

    ResolvedStep {
        display: display.trim().to_string(),
        annotation,
    }
}

/// Resolves every step of `steps` in order.
///
/// Steps without content yield `None` and are skipped; later steps still
/// resolve, and references to a skipped step render as [`INVALID_REFERENCE`].
pub fn resolve_all(steps: &[Step]) -> Vec<Option<ResolvedStep>> {
    let mut prior: Vec<Option<String>> = Vec::with_capacity(steps.len());
    let mut resolved = Vec::with_capacity(steps.len());

    for step in steps {
        let result = step
            .tokens()
            .map(|tokens| resolve_step(step.id, tokens, &prior));
        prior.push(result.as_ref().map(|r| r.display.clone()));
        resolved.push(result);
    }

    resolved
}

/// Lists the references in `tokens` that step `step_id` can never resolve:
/// `#0`, self references and forward references.
pub fn invalid_references(step_id: StepId, tokens: &[Token]) -> Vec<StepId> {
    tokens
        .iter()
        .filter_map(Token::reference_target)
        .filter(|&target| target == 0 || target >= step_id)
        .collect()
}

fn prior_display(step_id: StepId, target: StepId, prior: &[Option<String>]) -> Option<&str> {
    if target == 0 || target >= step_id {
        return None;
    }
    prior.get(target - 1)?.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::parse_labels;
    use pretty_assertions::assert_eq;

    fn step(id: StepId, labels: &[&str]) -> Step {
        Step::from_labels(id, labels.iter().copied())
    }

    #[test]
    fn literal_step() {
        let resolved = resolve_step(1, &parse_labels(["dogs"]), &[]);
        assert_eq!(resolved.display, "dogs");
        assert_eq!(resolved.annotation, "return dogs ");
    }

    #[test]
    fn back_reference_substitutes_prior_display() {
        let prior = vec![Some("dogs".to_string())];
        let resolved = resolve_step(2, &parse_labels(["#1", "that", "bark"]), &prior);
        assert_eq!(resolved.display, "dogs that bark");
        assert_eq!(resolved.annotation, "return #1 that bark ");
    }

    #[test]
    fn self_and_forward_references_render_sentinel() {
        let prior = vec![Some("dogs".to_string()), Some("dogs that bark".to_string())];
        let resolved = resolve_step(3, &parse_labels(["#3", "besides", "#4"]), &prior);
        assert_eq!(
            resolved.display,
            format!("{INVALID_REFERENCE} besides {INVALID_REFERENCE}")
        );
        assert_eq!(resolved.annotation, "return #3 besides #4 ");
    }

    #[test]
    fn zero_reference_is_invalid() {
        let resolved = resolve_step(2, &parse_labels(["#0"]), &[Some("dogs".into())]);
        assert_eq!(resolved.display, INVALID_REFERENCE);
    }

    #[test]
    fn overflowing_reference_is_invalid() {
        let prior = vec![Some("dogs".to_string())];
        let resolved = resolve_step(2, &parse_labels(["#99999999999999999999999", "bark"]), &prior);
        assert_eq!(resolved.display, format!("{INVALID_REFERENCE} bark"));
        assert_eq!(resolved.annotation, "return #99999999999999999999999 bark ");
    }

    #[test]
    fn annotation_keeps_reference_label_as_entered() {
        let prior = vec![Some("dogs".to_string())];
        let resolved = resolve_step(2, &parse_labels(["#01", "bark"]), &prior);
        assert_eq!(resolved.display, "dogs bark");
        assert_eq!(resolved.annotation, "return #01 bark ");
    }

    #[test]
    fn reference_to_empty_step_is_invalid() {
        let resolved = resolve_step(2, &parse_labels(["#1"]), &[None]);
        assert_eq!(resolved.display, INVALID_REFERENCE);
    }

    #[test]
    fn empty_token_list() {
        let resolved = resolve_step(1, &[], &[]);
        assert_eq!(resolved.display, "");
        assert_eq!(resolved.annotation, "return ");
    }

    #[test]
    fn resolve_all_chains_references() {
        let steps = vec![
            step(1, &["dogs"]),
            step(2, &["#1", "that", "bark"]),
            step(3, &["#2", "besides", "#3"]),
        ];
        let resolved = resolve_all(&steps);
        let display: Vec<String> = resolved
            .iter()
            .map(|r| r.as_ref().unwrap().display.clone())
            .collect();
        assert_eq!(
            display,
            vec![
                "dogs".to_string(),
                "dogs that bark".to_string(),
                format!("dogs that bark besides {INVALID_REFERENCE}"),
            ]
        );
    }

    #[test]
    fn resolve_all_skips_empty_steps_and_continues() {
        let steps = vec![Step::empty(1), step(2, &["cats"]), step(3, &["#1", "#2"])];
        let resolved = resolve_all(&steps);
        assert!(resolved[0].is_none());
        assert_eq!(resolved[1].as_ref().unwrap().display, "cats");
        assert_eq!(
            resolved[2].as_ref().unwrap().display,
            format!("{INVALID_REFERENCE} cats")
        );
    }

    #[test]
    fn nested_references_expand_fully() {
        let steps = vec![
            step(1, &["rivers"]),
            step(2, &["#1", "in", "Europe"]),
            step(3, &["number", "of", "#2"]),
        ];
        let resolved = resolve_all(&steps);
        assert_eq!(
            resolved[2].as_ref().unwrap().display,
            "number of rivers in Europe"
        );
    }

    #[test]
    fn invalid_references_lists_forward_and_self() {
        let tokens = parse_labels(["#1", "#0", "#2", "#5", "word"]);
        assert_eq!(invalid_references(2, &tokens), vec![0, 2, 5]);
        assert!(invalid_references(3, &parse_labels(["#1", "#2"])).is_empty());
    }
}
