//! `qdmr config` -- manage configuration (set/get/list/unset/path).
//!
//! `get` and `list` show the effective configuration, including `QDMR_*`
//! environment overrides. `set` and `unset` edit `.qdmr/config.yaml` only.

use anyhow::{Context, Result, bail};
use qdmr_config::config::{CONFIG_FILE_NAME, load_config_file, save_config};
use qdmr_ui::styles::render_muted;

use crate::cli::{ConfigArgs, ConfigCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `qdmr config` command.
pub fn run(ctx: &RuntimeContext, args: &ConfigArgs) -> Result<()> {
    match &args.command {
        ConfigCommands::Set(set_args) => {
            let qdmr_dir = ctx.require_qdmr_dir()?;
            let mut config = load_config_file(qdmr_dir)?;
            config.set(&set_args.key, &set_args.value)?;
            save_config(qdmr_dir, &config)
                .with_context(|| format!("failed to save config in {}", qdmr_dir.display()))?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "key": set_args.key,
                    "value": set_args.value,
                }));
            } else if !ctx.quiet {
                println!("Set {} = {}", set_args.key, set_args.value);
            }
        }

        ConfigCommands::Get(get_args) => {
            let value = ctx.config.get(&get_args.key)?;
            if ctx.json {
                output_json(&serde_json::json!({
                    "key": get_args.key,
                    "value": value,
                }));
            } else {
                match value {
                    Some(v) => println!("{}", v),
                    None => bail!("key '{}' is not set", get_args.key),
                }
            }
        }

        ConfigCommands::List => {
            let entries = ctx.config.entries();
            if ctx.json {
                let map: serde_json::Map<String, serde_json::Value> = entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                output_json(&map);
            } else {
                for (key, value) in &entries {
                    if value.is_empty() {
                        println!("{} = {}", key, render_muted("(unset)"));
                    } else {
                        println!("{} = {}", key, value);
                    }
                }
            }
        }

        ConfigCommands::Unset(unset_args) => {
            let qdmr_dir = ctx.require_qdmr_dir()?;
            let mut config = load_config_file(qdmr_dir)?;
            config.unset(&unset_args.key)?;
            save_config(qdmr_dir, &config)
                .with_context(|| format!("failed to save config in {}", qdmr_dir.display()))?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "key": unset_args.key,
                    "value": config.get(&unset_args.key)?,
                }));
            } else if !ctx.quiet {
                println!("Unset {}", unset_args.key);
            }
        }

        ConfigCommands::Path => {
            let path = ctx.require_qdmr_dir()?.join(CONFIG_FILE_NAME);
            if ctx.json {
                output_json(&serde_json::json!({ "path": path }));
            } else {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
