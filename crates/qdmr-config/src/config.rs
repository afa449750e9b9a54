//! Configuration types and loading for the qdmr annotator.
//!
//! The main entry point is [`QdmrConfig`], which represents the contents of
//! `.qdmr/config.yaml`. Configuration is loaded with [`load_config`], which
//! layers defaults, the YAML file and `QDMR_*` environment variables, and
//! saved with [`save_config`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use qdmr_core::store::ReferencePolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::qdmr_dir::project_root;

/// File name of the configuration inside `.qdmr/`.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Prefix of environment variables that override configuration values.
/// Nested keys use `__`, e.g. `QDMR_VALIDATION__TOKENS=error`.
pub const ENV_PREFIX: &str = "QDMR_";

/// Configuration keys accepted by [`QdmrConfig::get`] and [`QdmrConfig::set`].
pub const KNOWN_KEYS: &[&str] = &[
    "dataset",
    "json",
    "references.on-delete",
    "validation.tokens",
];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The layered configuration could not be extracted.
    #[error("failed to load config: {0}")]
    LoadError(#[from] Box<figment::Error>),

    /// The configuration could not be serialized to YAML.
    #[error("failed to write config file: {0}")]
    WriteError(#[from] serde_yaml::Error),

    /// The key is not a known configuration key.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Token validation
// ---------------------------------------------------------------------------

/// How the editing front-end treats tokens outside the question's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenValidation {
    /// Accept any token.
    None,
    /// Accept the step but print a warning.
    #[default]
    Warn,
    /// Refuse the step.
    Error,
}

impl TokenValidation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TokenValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenValidation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown validation mode '{other}' (expected 'none', 'warn' or 'error')"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Back-reference handling section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReferencesConfig {
    /// What deleting a step does to references in other steps.
    #[serde(default, rename = "on-delete", alias = "on_delete")]
    pub on_delete: ReferencePolicy,
}

/// Vocabulary validation section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationConfig {
    /// Behavior for tokens outside the question's vocabulary.
    #[serde(default)]
    pub tokens: TokenValidation,
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full qdmr configuration, corresponding to `.qdmr/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QdmrConfig {
    /// Path to the question dataset (`store.json`). Relative paths resolve
    /// against the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,

    /// Output JSON instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub references: ReferencesConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

impl QdmrConfig {
    /// Returns the value of a configuration key, or `None` if it is unset.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "dataset" => self.dataset.clone(),
            "json" => Some(self.json.to_string()),
            "references.on-delete" => Some(self.references.on_delete.to_string()),
            "validation.tokens" => Some(self.validation.tokens.to_string()),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    /// Sets a configuration key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: key.to_string(),
            reason,
        };

        match key {
            "dataset" => {
                if value.trim().is_empty() {
                    return Err(invalid("dataset path cannot be empty".to_string()));
                }
                self.dataset = Some(value.to_string());
            }
            "json" => {
                self.json = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("expected 'true' or 'false', got '{value}'")))?;
            }
            "references.on-delete" => self.references.on_delete = value.parse().map_err(invalid)?,
            "validation.tokens" => self.validation.tokens = value.parse().map_err(invalid)?,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Resets a configuration key to its default.
    pub fn unset(&mut self, key: &str) -> Result<()> {
        let defaults = Self::default();
        match key {
            "dataset" => self.dataset = defaults.dataset,
            "json" => self.json = defaults.json,
            "references.on-delete" => self.references = defaults.references,
            "validation.tokens" => self.validation = defaults.validation,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Returns every known key with its current value (`""` when unset).
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        KNOWN_KEYS
            .iter()
            .map(|&key| (key, self.get(key).ok().flatten().unwrap_or_default()))
            .collect()
    }

    /// Resolves the configured dataset path against the project root that
    /// owns `qdmr_dir`.
    pub fn dataset_path(&self, qdmr_dir: &Path) -> Option<PathBuf> {
        let dataset = PathBuf::from(self.dataset.as_ref()?);
        if dataset.is_absolute() {
            Some(dataset)
        } else {
            Some(project_root(qdmr_dir).join(dataset))
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load configuration for the given `.qdmr/` directory.
///
/// Layers, lowest priority first: built-in defaults, `.qdmr/config.yaml`
/// (skipped when missing or empty), then `QDMR_*` environment variables.
pub fn load_config(qdmr_dir: &Path) -> Result<QdmrConfig> {
    extract(file_figment(qdmr_dir)?.merge(env_provider()))
}

/// Load only what is stored in `.qdmr/config.yaml` (over the defaults),
/// ignoring the environment. Used before editing and saving the file.
pub fn load_config_file(qdmr_dir: &Path) -> Result<QdmrConfig> {
    extract(file_figment(qdmr_dir)?)
}

/// Load configuration when no `.qdmr/` directory exists: defaults plus
/// environment overrides.
pub fn load_default_config() -> Result<QdmrConfig> {
    extract(Figment::from(Serialized::defaults(QdmrConfig::default())).merge(env_provider()))
}

fn file_figment(qdmr_dir: &Path) -> Result<Figment> {
    let config_path = qdmr_dir.join(CONFIG_FILE_NAME);

    let mut figment = Figment::from(Serialized::defaults(QdmrConfig::default()));
    if config_path.exists() && !std::fs::read_to_string(&config_path)?.trim().is_empty() {
        figment = figment.merge(Yaml::file(&config_path));
    }
    Ok(figment)
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

fn extract(figment: Figment) -> Result<QdmrConfig> {
    figment
        .extract()
        .map_err(|e| ConfigError::from(Box::new(e)))
}

/// Save configuration to `config.yaml` inside the given `.qdmr/` directory.
///
/// The directory is created if it does not exist.
pub fn save_config(qdmr_dir: &Path, config: &QdmrConfig) -> Result<()> {
    std::fs::create_dir_all(qdmr_dir)?;

    let config_path = qdmr_dir.join(CONFIG_FILE_NAME);
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(config_path, yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let cfg = QdmrConfig::default();
        assert!(cfg.dataset.is_none());
        assert!(!cfg.json);
        assert_eq!(cfg.references.on_delete, ReferencePolicy::Renumber);
        assert_eq!(cfg.validation.tokens, TokenValidation::Warn);
    }

    #[test]
    fn test_load_missing_config_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join(".qdmr")).unwrap();
        assert_eq!(cfg.references, ReferencesConfig::default());
    }

    #[test]
    fn test_load_empty_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "\n").unwrap();
        let cfg = load_config(dir.path()).unwrap();
        assert_eq!(cfg.validation.tokens, TokenValidation::Warn);
    }

    #[test]
    fn test_roundtrip_config() {
        let dir = tempfile::tempdir().unwrap();
        let qdmr_dir = dir.path().join(".qdmr");

        let mut cfg = QdmrConfig::default();
        cfg.set("dataset", "data/store.json").unwrap();
        cfg.set("references.on-delete", "preserve").unwrap();
        cfg.set("validation.tokens", "error").unwrap();

        save_config(&qdmr_dir, &cfg).unwrap();
        let loaded = load_config_file(&qdmr_dir).unwrap();

        assert_eq!(loaded.dataset.as_deref(), Some("data/store.json"));
        assert_eq!(loaded.references.on_delete, ReferencePolicy::Preserve);
        assert_eq!(loaded.validation.tokens, TokenValidation::Error);
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = "references:\n  on-delete: preserve\n";
        let cfg: QdmrConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.references.on_delete, ReferencePolicy::Preserve);
        assert_eq!(cfg.validation.tokens, TokenValidation::Warn);
        assert!(!cfg.json);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut cfg = QdmrConfig::default();
        assert!(matches!(
            cfg.set("references.on-delete", "shift"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("json", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("dataset", "  "),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("colour", "red"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert_eq!(cfg, QdmrConfig::default());
    }

    #[test]
    fn test_get_and_unset() {
        let mut cfg = QdmrConfig::default();
        assert_eq!(cfg.get("dataset").unwrap(), None);
        cfg.set("json", "true").unwrap();
        assert_eq!(cfg.get("json").unwrap().as_deref(), Some("true"));
        cfg.unset("json").unwrap();
        assert_eq!(cfg.get("json").unwrap().as_deref(), Some("false"));
        assert!(cfg.get("nope").is_err());
    }

    #[test]
    fn test_entries_cover_known_keys() {
        let entries = QdmrConfig::default().entries();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, KNOWN_KEYS);
        assert_eq!(entries[0].1, "");
    }

    #[test]
    fn test_dataset_path_resolves_against_project_root() {
        let mut cfg = QdmrConfig::default();
        let qdmr_dir = Path::new("/work/batch/.qdmr");
        assert_eq!(cfg.dataset_path(qdmr_dir), None);

        cfg.dataset = Some("store.json".into());
        assert_eq!(
            cfg.dataset_path(qdmr_dir),
            Some(PathBuf::from("/work/batch/store.json"))
        );

        cfg.dataset = Some("/data/store.json".into());
        assert_eq!(
            cfg.dataset_path(qdmr_dir),
            Some(PathBuf::from("/data/store.json"))
        );
    }

    #[test]
    fn test_token_validation_parses() {
        assert_eq!("ERROR".parse::<TokenValidation>(), Ok(TokenValidation::Error));
        assert!("strict".parse::<TokenValidation>().is_err());
    }
}
