//! Clap CLI definitions for the `qdmr` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// qdmr -- question decomposition annotator.
///
/// Break a question into numbered steps, reference earlier steps with `#n`,
/// preview the resolved decomposition and produce a submission code.
#[derive(Parser, Debug)]
#[command(
    name = "qdmr",
    about = "Question decomposition annotator",
    long_about = "Break a question into numbered steps, reference earlier steps with #n, preview the resolved decomposition and produce a submission code.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Question dataset (default: config `dataset`, then ./store.json).
    #[arg(long, global = true, env = "QDMR_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Annotate a question interactively (commands are read from stdin).
    #[command(alias = "a")]
    Annotate(AnnotateArgs),

    /// Render a decomposition file and print its submission code.
    Render(RenderArgs),

    /// Show a question and its vocabulary.
    Question(QuestionArgs),

    /// List questions in the dataset.
    List(ListArgs),

    /// Manage configuration.
    Config(ConfigArgs),

    /// Create a .qdmr directory with a default config.
    Init(InitArgs),

    /// Generate shell completion scripts.
    Completion(CompletionArgs),

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// Annotate / Render / Question / List
// ---------------------------------------------------------------------------

/// Arguments for `qdmr annotate`.
#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Question id, e.g. SPIDER_train_3983 (a LOW_ prefix marks a granular task).
    pub question_id: String,
}

/// Arguments for `qdmr render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// JSON file holding the steps (`[{"id": 1, "value": [{"label": "..."}]}]`), or `-` for stdin.
    pub file: PathBuf,

    /// Question id whose text is shown above the preview.
    #[arg(long)]
    pub question: Option<String>,
}

/// Arguments for `qdmr question`.
#[derive(Args, Debug)]
pub struct QuestionArgs {
    /// Question id.
    pub question_id: String,
}

/// Arguments for `qdmr list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Maximum number of questions to show.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Arguments for `qdmr init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Dataset path to record in the new config.
    #[arg(long)]
    pub dataset: Option<String>,

    /// Overwrite an existing config.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Arguments for `qdmr config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a configuration value.
    Set(ConfigSetArgs),
    /// Get a configuration value.
    Get(ConfigGetArgs),
    /// List all configuration values.
    List,
    /// Reset a configuration value to its default.
    Unset(ConfigUnsetArgs),
    /// Print the path of the config file.
    Path,
}

/// Arguments for `qdmr config set`.
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Arguments for `qdmr config get`.
#[derive(Args, Debug)]
pub struct ConfigGetArgs {
    /// Configuration key.
    pub key: String,
}

/// Arguments for `qdmr config unset`.
#[derive(Args, Debug)]
pub struct ConfigUnsetArgs {
    /// Configuration key.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Arguments for `qdmr completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Completion subcommands.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate Bash completions.
    Bash,
    /// Generate Zsh completions.
    Zsh,
    /// Generate Fish completions.
    Fish,
    /// Generate PowerShell completions.
    Powershell,
}
