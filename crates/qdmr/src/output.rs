//! Output formatting helpers for the `qdmr` CLI.
//!
//! Provides JSON output, table formatting, and the view models that commands
//! serialize for `--json`.

use std::io::{self, Write};

use chrono::Utc;
use qdmr_core::question::QuestionId;
use qdmr_core::step::{Step, StepId};
use qdmr_core::store::{Preview, PreviewLine, PreviewState};
use qdmr_ui::styles::{
    render_bold, render_category, render_muted, render_preview_line, render_preview_state,
    render_step_number, render_step_tokens, render_warn, render_warn_icon,
};
use serde::Serialize;

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
///
/// Each row is a `Vec<String>` with columns matching the headers.
/// Column widths are computed from the data for alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{:<width$}", header, width = widths[i]);
    }
    let _ = writeln!(handle);

    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{}", "-".repeat(*width));
    }
    let _ = writeln!(handle);

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                let _ = write!(handle, "  ");
            }
            // The last column is not padded.
            if i + 1 < widths.len() {
                let _ = write!(handle, "{:<width$}", cell, width = widths[i]);
            } else {
                let _ = write!(handle, "{}", cell);
            }
        }
        let _ = writeln!(handle);
    }
}

// ---------------------------------------------------------------------------
// View models
// ---------------------------------------------------------------------------

/// JSON view of a step's raw content.
#[derive(Debug, Serialize)]
pub struct StepView {
    pub id: StepId,
    /// Raw labels, `null` for a step without content.
    pub tokens: Option<Vec<String>>,
}

impl StepView {
    pub fn from_step(step: &Step) -> Self {
        Self {
            id: step.id,
            tokens: step
                .tokens()
                .map(|tokens| tokens.iter().map(|t| t.label().to_string()).collect()),
        }
    }
}

/// JSON view of a preview.
#[derive(Debug, Serialize)]
pub struct PreviewView {
    pub state: PreviewState,
    pub steps: Vec<PreviewLine>,
    /// Steps whose display contains an unresolved reference.
    pub invalid_steps: Vec<StepId>,
    /// Present only when the preview is current.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_code: Option<String>,
}

impl PreviewView {
    pub fn from_preview(preview: &Preview) -> Self {
        Self {
            state: preview.state,
            steps: preview.lines.clone(),
            invalid_steps: preview.invalid_lines(),
            submission_code: preview.is_valid().then(|| preview.submission_code()),
        }
    }
}

/// JSON view of a submitted decomposition.
#[derive(Debug, Serialize)]
pub struct SubmissionView {
    pub question_id: String,
    pub granular: bool,
    pub submission_code: String,
    pub steps: usize,
    /// RFC 3339 timestamp of the submission.
    pub created_at: String,
}

impl SubmissionView {
    pub fn new(question_id: &QuestionId, submission_code: String, steps: usize) -> Self {
        Self {
            question_id: question_id.to_string(),
            granular: question_id.is_granular(),
            submission_code,
            steps,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Formats a preview: one `n. <display>` line per step, then a warning for
/// unresolved references.
pub fn format_preview(preview: &Preview) -> String {
    let mut out = String::new();
    for line in &preview.lines {
        out.push_str(&render_preview_line(line));
        out.push('\n');
    }

    let invalid = preview.invalid_lines();
    if !invalid.is_empty() {
        let ids: Vec<String> = invalid.iter().map(|id| id.to_string()).collect();
        out.push_str(&format!(
            "{} {}\n",
            render_warn_icon(),
            render_warn(&format!(
                "step(s) {} reference a step that is not earlier in the list",
                ids.join(", ")
            ))
        ));
    }
    out
}

/// Formats the raw steps with the preview state.
pub fn format_steps(steps: &[Step], state: PreviewState) -> String {
    let mut out = format!(
        "{} {}\n",
        render_category("steps"),
        render_muted(&format!("({})", render_preview_state(state)))
    );
    for step in steps {
        out.push_str(&format!(
            "{} {}\n",
            render_step_number(step.id),
            render_step_tokens(step)
        ));
    }
    out
}

/// Formats the question header shown above previews.
pub fn format_question(id: &QuestionId, text: &str) -> String {
    let granular = if id.is_granular() {
        render_muted(" (granular)")
    } else {
        String::new()
    };
    format!(
        "{} {}{}\n{}\n",
        render_category("question"),
        render_muted(id.as_str()),
        granular,
        render_bold(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use qdmr_core::store::DecompositionStore;

    fn store() -> DecompositionStore {
        let mut store = DecompositionStore::new();
        store.edit_step(Step::from_labels(1, ["dogs"])).unwrap();
        store.add_step(Step::from_labels(2, ["#1", "that", "bark"])).unwrap();
        store
    }

    #[test]
    fn preview_view_omits_code_while_editing() {
        let view = PreviewView::from_preview(&store().preview());
        assert_eq!(view.state, PreviewState::Editing);
        assert!(view.submission_code.is_none());
    }

    #[test]
    fn preview_view_carries_code_when_previewed() {
        let mut store = store();
        let view = PreviewView::from_preview(&store.display_decomposition());
        assert_eq!(
            view.submission_code.as_deref(),
            Some("return dogs ;return #1 that bark ")
        );
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "previewed");
        assert_eq!(json["steps"][1]["display"], "dogs that bark");
    }

    #[test]
    fn step_view_keeps_null_for_empty_step() {
        let json = serde_json::to_value(StepView::from_step(&Step::empty(2))).unwrap();
        assert_eq!(json, serde_json::json!({"id": 2, "tokens": null}));
    }

    #[test]
    fn format_preview_warns_on_forward_reference() {
        let mut store = DecompositionStore::new();
        store.edit_step(Step::from_labels(1, ["#2", "dogs"])).unwrap();
        let text = format_preview(&store.display_decomposition());
        assert!(text.contains("dogs"));
        assert!(text.contains("step(s) 1"));
    }

    #[test]
    fn submission_view_records_granularity() {
        let id = QuestionId::parse("LOW_SPIDER_train_1").unwrap();
        let view = SubmissionView::new(&id, "return dogs ".into(), 1);
        assert_eq!(view.question_id, "SPIDER_train_1");
        assert!(view.granular);
        assert!(chrono::DateTime::parse_from_rfc3339(&view.created_at).is_ok());
    }
}
