//! `qdmr question` -- show a question and its vocabulary.

use anyhow::{Context, Result};
use qdmr_core::dataset::QuestionLookup;
use qdmr_core::question::QuestionId;
use qdmr_core::vocabulary::Vocabulary;
use qdmr_ui::styles::{render_category, render_muted};

use crate::cli::QuestionArgs;
use crate::context::RuntimeContext;
use crate::output::{format_question, output_json};

/// Execute the `qdmr question` command.
pub fn run(ctx: &RuntimeContext, args: &QuestionArgs) -> Result<()> {
    let id = QuestionId::parse(&args.question_id)?;
    let dataset = ctx.open_dataset()?;
    let question = dataset
        .lookup(&id)
        .with_context(|| format!("question '{id}' not found"))?;
    let vocabulary = Vocabulary::new(&question.valid_tokens);

    if ctx.json {
        output_json(&serde_json::json!({
            "id": id,
            "granular": id.is_granular(),
            "source": id.source(),
            "text": question.text,
            "valid_tokens": vocabulary.sorted_words(),
        }));
        return Ok(());
    }

    print!("{}", format_question(&id, &question.text));
    if vocabulary.is_empty() {
        println!("{}", render_muted("(no vocabulary for this question)"));
    } else {
        println!();
        println!(
            "{} {}",
            render_category("vocabulary"),
            render_muted(&format!("({} tokens)", vocabulary.len()))
        );
        println!("{}", vocabulary.sorted_words().join(", "));
    }
    Ok(())
}
