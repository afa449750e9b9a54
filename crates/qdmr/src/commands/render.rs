//! `qdmr render` -- preview a decomposition file and print its submission code.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use qdmr_core::dataset::QuestionLookup;
use qdmr_core::question::QuestionId;
use qdmr_core::step::Step;
use qdmr_core::store::{DecompositionStore, ReferencePolicy};
use qdmr_ui::styles::{render_category, render_separator};
use serde::Serialize;
use tracing::debug;

use crate::cli::RenderArgs;
use crate::context::RuntimeContext;
use crate::output::{PreviewView, format_preview, format_question, output_json};

#[derive(Serialize)]
struct RenderView {
    #[serde(skip_serializing_if = "Option::is_none")]
    question_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<String>,
    #[serde(flatten)]
    preview: PreviewView,
}

/// Execute the `qdmr render` command.
pub fn run(ctx: &RuntimeContext, args: &RenderArgs) -> Result<()> {
    let question = match &args.question {
        Some(raw) => {
            let id = QuestionId::parse(raw)?;
            let dataset = ctx.open_dataset()?;
            let question = dataset
                .lookup(&id)
                .cloned()
                .with_context(|| format!("question '{id}' not found"))?;
            Some((id, question))
        }
        None => None,
    };

    let steps = read_steps(&args.file)?;
    let mut store = build_store(steps, ctx.policy())
        .with_context(|| format!("invalid decomposition in {}", args.file.display()))?;
    let preview = store.display_decomposition();

    if ctx.json {
        output_json(&RenderView {
            question_id: question.as_ref().map(|(id, _)| id.to_string()),
            question: question.as_ref().map(|(_, q)| q.text.clone()),
            preview: PreviewView::from_preview(&preview),
        });
        return Ok(());
    }

    if let Some((id, q)) = &question {
        print!("{}", format_question(id, &q.text));
        println!("{}", render_separator());
    }
    print!("{}", format_preview(&preview));
    if !ctx.quiet {
        println!();
        println!("{}", render_category("submission code"));
    }
    println!("{}", preview.submission_code());
    Ok(())
}

/// Reads a JSON step list from `path`, or from stdin when `path` is `-`.
fn read_steps(path: &Path) -> Result<Vec<Step>> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read steps from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("{} is not a JSON step list", path.display()))
}

/// Feeds `steps` through a fresh store in id order.
///
/// The first step replaces the store's initial empty step and the rest are
/// appended, so ids must run `1..=n`.
fn build_store(steps: Vec<Step>, policy: ReferencePolicy) -> Result<DecompositionStore> {
    if steps.is_empty() {
        bail!("the step list is empty");
    }

    let mut store = DecompositionStore::with_policy(policy);
    for (index, step) in steps.into_iter().enumerate() {
        debug!(id = step.id, "loading step");
        if index > 0 {
            store.add_step(step)?;
        } else if step.id == 1 {
            store.edit_step(step)?;
        } else {
            bail!("the first step must have id 1, found {}", step.id);
        }
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn parse(json: &str) -> Vec<Step> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn builds_store_from_wire_steps() {
        let steps = parse(
            r##"[
                {"id": 1, "value": [{"label": "dogs"}]},
                {"id": 2, "value": null},
                {"id": 3, "value": [{"label": "#1"}, {"label": "that"}, {"label": "bark"}]}
            ]"##,
        );
        let mut store = build_store(steps, ReferencePolicy::Renumber).unwrap();
        let preview = store.display_decomposition();
        assert_eq!(preview.submission_code(), "return dogs ;;return #1 that bark ");
        assert_eq!(preview.lines[2].display.as_deref(), Some("dogs that bark"));
    }

    #[test]
    fn rejects_gaps_and_empty_lists() {
        let gap = parse(r#"[{"id": 1, "value": null}, {"id": 3, "value": null}]"#);
        assert!(build_store(gap, ReferencePolicy::Renumber).is_err());
        assert!(build_store(Vec::new(), ReferencePolicy::Renumber).is_err());
        let twice = parse(r#"[{"id": 1, "value": null}, {"id": 1, "value": null}]"#);
        assert!(build_store(twice, ReferencePolicy::Renumber).is_err());
        let late = parse(r#"[{"id": 2, "value": null}]"#);
        assert!(build_store(late, ReferencePolicy::Renumber).is_err());
    }

    #[test]
    fn read_steps_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"id\": 1}").unwrap();
        let err = read_steps(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("not a JSON step list"));
    }
}
