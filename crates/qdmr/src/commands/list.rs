//! `qdmr list` -- list questions in the dataset.

use anyhow::Result;
use qdmr_ui::styles::truncate;
use qdmr_ui::terminal::terminal_width;

use crate::cli::ListArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

/// Execute the `qdmr list` command.
pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let dataset = ctx.open_dataset()?;
    let limit = args.limit.unwrap_or(usize::MAX);
    let questions: Vec<_> = dataset.iter().take(limit).collect();

    if ctx.json {
        let items: Vec<serde_json::Value> = questions
            .iter()
            .map(|(id, q)| {
                serde_json::json!({
                    "id": id,
                    "text": q.text,
                    "tokens": q.valid_tokens.len(),
                })
            })
            .collect();
        output_json(&items);
        return Ok(());
    }

    if questions.is_empty() {
        if !ctx.quiet {
            println!("No questions in dataset");
        }
        return Ok(());
    }

    let id_width = questions.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
    let text_width = terminal_width().saturating_sub(id_width + 2).max(20);
    let rows: Vec<Vec<String>> = questions
        .iter()
        .map(|(id, q)| vec![id.to_string(), truncate(&q.text, text_width)])
        .collect();
    output_table(&["ID", "QUESTION"], &rows);

    if !ctx.quiet && questions.len() < dataset.len() {
        println!("\n{} of {} questions", questions.len(), dataset.len());
    }
    Ok(())
}
