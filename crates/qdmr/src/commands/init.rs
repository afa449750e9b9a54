//! `qdmr init` -- create a `.qdmr` directory in the current directory.

use std::env;

use anyhow::{Context, Result, bail};
use qdmr_config::config::{CONFIG_FILE_NAME, QdmrConfig, save_config};
use qdmr_config::qdmr_dir::ensure_qdmr_dir;
use qdmr_ui::styles::{render_muted, render_pass_icon};

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `qdmr init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    let config_path = cwd.join(".qdmr").join(CONFIG_FILE_NAME);

    if !args.force && config_path.exists() {
        bail!(
            "{} already exists\nHint: use --force to overwrite it",
            config_path.display()
        );
    }

    let qdmr_dir = ensure_qdmr_dir(&cwd)
        .with_context(|| format!("failed to create .qdmr in {}", cwd.display()))?;

    let mut config = QdmrConfig::default();
    if let Some(dataset) = &args.dataset {
        config.set("dataset", dataset)?;
    }
    save_config(&qdmr_dir, &config)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "path": qdmr_dir,
            "config": config,
        }));
    } else if !ctx.quiet {
        println!(
            "{} Initialized qdmr in {}",
            render_pass_icon(),
            qdmr_dir.display()
        );
        if config.dataset.is_none() {
            println!(
                "{}",
                render_muted("Set the question dataset with: qdmr config set dataset <PATH>")
            );
        }
    }

    Ok(())
}
