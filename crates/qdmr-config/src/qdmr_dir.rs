//! Discovery and management of the `.qdmr/` directory.
//!
//! The `.qdmr/` directory holds the project's `config.yaml`. This module
//! finds it by walking up the directory tree and creates it on `qdmr init`.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

/// The name of the qdmr metadata directory.
pub const QDMR_DIR_NAME: &str = ".qdmr";

/// The name of the environment variable that can override the qdmr directory.
pub const QDMR_DIR_ENV: &str = "QDMR_DIR";

/// Walk up the directory tree from `start` looking for a `.qdmr/` directory.
///
/// Returns the path to the `.qdmr/` directory if found, or `None` if the
/// filesystem root is reached without finding one. The `QDMR_DIR`
/// environment variable is checked first (highest priority).
///
/// # Examples
///
/// ```no_run
/// use qdmr_config::qdmr_dir::find_qdmr_dir;
/// use std::path::Path;
///
/// if let Some(dir) = find_qdmr_dir(Path::new(".")) {
///     println!("Found qdmr dir at {}", dir.display());
/// }
/// ```
pub fn find_qdmr_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(QDMR_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }

    let start = start.canonicalize().ok()?;

    start
        .ancestors()
        .map(|dir| dir.join(QDMR_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

/// Ensure a `.qdmr/` directory exists at the given path.
///
/// If `path` itself is not called `.qdmr`, a `.qdmr/` subdirectory is created
/// under it. Returns the path to the `.qdmr/` directory.
pub fn ensure_qdmr_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let qdmr_dir = if path.ends_with(QDMR_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(QDMR_DIR_NAME)
    };

    std::fs::create_dir_all(&qdmr_dir)?;
    Ok(qdmr_dir)
}

/// The project root a `.qdmr/` directory belongs to (its parent).
pub fn project_root(qdmr_dir: &Path) -> &Path {
    qdmr_dir.parent().unwrap_or(qdmr_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_dir_in_start() {
        let dir = tempfile::tempdir().unwrap();
        let qdmr = dir.path().join(".qdmr");
        std::fs::create_dir(&qdmr).unwrap();

        let found = find_qdmr_dir(dir.path()).unwrap().canonicalize().unwrap();
        assert_eq!(found, qdmr.canonicalize().unwrap());
    }

    #[test]
    fn finds_dir_from_child() {
        let dir = tempfile::tempdir().unwrap();
        let qdmr = dir.path().join(".qdmr");
        std::fs::create_dir(&qdmr).unwrap();

        let child = dir.path().join("batches").join("week1");
        std::fs::create_dir_all(&child).unwrap();

        let found = find_qdmr_dir(&child).unwrap().canonicalize().unwrap();
        assert_eq!(found, qdmr.canonicalize().unwrap());
    }

    #[test]
    fn missing_start_path_is_none() {
        assert!(find_qdmr_dir(Path::new("/nonexistent/qdmr/start")).is_none());
    }

    #[test]
    fn ensure_creates_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let result = ensure_qdmr_dir(dir.path()).unwrap();
        assert!(result.is_dir());
        assert!(result.ends_with(".qdmr"));
        assert_eq!(project_root(&result), dir.path());
    }

    #[test]
    fn ensure_accepts_named_dir_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let qdmr = dir.path().join(".qdmr");
        assert_eq!(ensure_qdmr_dir(&qdmr).unwrap(), qdmr);
        assert_eq!(ensure_qdmr_dir(dir.path()).unwrap(), qdmr);
    }
}
