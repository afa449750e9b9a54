//! `qdmr` -- question decomposition annotator.
//!
//! Parses CLI arguments with clap, resolves the runtime context (config,
//! dataset location, output mode) and dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Tracks whether a Ctrl+C has already been received.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

fn main() {
    // First Ctrl+C: exit cleanly. Second: force exit.
    let _ = ctrlc::set_handler(|| {
        if CTRLC_RECEIVED.swap(true, Ordering::SeqCst) {
            std::process::exit(1);
        }
        std::process::exit(0);
    });

    let cli = Cli::parse();

    if cli.global.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("qdmr=debug,qdmr_core=debug,qdmr_config=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    let mut json = cli.global.json;
    let result = RuntimeContext::from_global_args(&cli.global).and_then(|ctx| {
        json = ctx.json;
        dispatch(&ctx, cli.command)
    });

    if let Err(e) = result {
        if json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn dispatch(ctx: &RuntimeContext, command: Option<Commands>) -> anyhow::Result<()> {
    match command {
        Some(Commands::Annotate(args)) => commands::annotate::run(ctx, &args),
        Some(Commands::Render(args)) => commands::render::run(ctx, &args),
        Some(Commands::Question(args)) => commands::question::run(ctx, &args),
        Some(Commands::List(args)) => commands::list::run(ctx, &args),
        Some(Commands::Config(args)) => commands::config_cmd::run(ctx, &args),
        Some(Commands::Init(args)) => commands::init::run(ctx, &args),
        Some(Commands::Completion(args)) => commands::completion::run(ctx, &args),
        Some(Commands::Version) => commands::version::run(ctx),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    }
}
