//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds everything a command handler needs: global
//! flags, the discovered `.qdmr/` directory, the loaded configuration and the
//! resolved dataset location.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use qdmr_config::config::{QdmrConfig, TokenValidation, load_config, load_default_config};
use qdmr_config::qdmr_dir::find_qdmr_dir;
use qdmr_core::dataset::QuestionStore;
use qdmr_core::store::ReferencePolicy;
use tracing::debug;

use crate::cli::GlobalArgs;

/// Dataset file used when neither the flag nor the config names one.
pub const DEFAULT_DATASET: &str = "store.json";

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Dataset path given with `--dataset` or `QDMR_DATASET`.
    pub dataset: Option<PathBuf>,

    /// Whether to produce JSON output (flag or config).
    pub json: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,

    /// The `.qdmr/` directory, if one was found.
    pub qdmr_dir: Option<PathBuf>,

    /// Loaded configuration (defaults when there is no `.qdmr/`).
    pub config: QdmrConfig,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// Discovers `.qdmr/` from the current directory and loads its config.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let cwd = env::current_dir().context("failed to get current directory")?;
        let qdmr_dir = find_qdmr_dir(&cwd);

        let config = match &qdmr_dir {
            Some(dir) => load_config(dir)
                .with_context(|| format!("failed to load config from {}", dir.display()))?,
            None => load_default_config().context("failed to load config")?,
        };
        debug!(?qdmr_dir, ?config, "runtime context resolved");

        Ok(Self {
            dataset: global.dataset.clone(),
            json: global.json || config.json,
            quiet: global.quiet,
            qdmr_dir,
            config,
        })
    }

    /// Returns the dataset path.
    ///
    /// Priority: `--dataset` / `QDMR_DATASET` > config `dataset` (relative to
    /// the project root) > `./store.json`.
    pub fn resolve_dataset_path(&self) -> PathBuf {
        if let Some(ref p) = self.dataset {
            return p.clone();
        }
        let configured = match &self.qdmr_dir {
            Some(dir) => self.config.dataset_path(dir),
            None => self.config.dataset.as_ref().map(PathBuf::from),
        };
        configured.unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET))
    }

    /// Loads the question dataset.
    pub fn open_dataset(&self) -> Result<QuestionStore> {
        let path = self.resolve_dataset_path();
        QuestionStore::open(&path).context(
            "cannot load the question dataset (pass --dataset or run 'qdmr config set dataset <PATH>')",
        )
    }

    /// The `.qdmr/` directory, or an error pointing at `qdmr init`.
    pub fn require_qdmr_dir(&self) -> Result<&Path> {
        self.qdmr_dir
            .as_deref()
            .context("no .qdmr directory found (run 'qdmr init' first)")
    }

    pub fn policy(&self) -> ReferencePolicy {
        self.config.references.on_delete
    }

    pub fn token_validation(&self) -> TokenValidation {
        self.config.validation.tokens
    }
}
