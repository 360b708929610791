//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! gitpipe has two configuration scopes:
//! - **Global**: User-level settings (which git to run)
//! - **Repo**: Repository-level overrides (notes namespace)
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$GITPIPE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitpipe/config.toml`
//! 3. `~/.gitpipe/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use gitpipe::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! println!("git: {}", config.git_binary());
//! println!("notes under: {}", config.notes_namespace());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Default program spawned for worker processes.
pub const DEFAULT_GIT_BINARY: &str = "git";

/// Default namespace for short notes ref names.
pub const DEFAULT_NOTES_NAMESPACE: &str = "refs/notes";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `git_dir` is provided, also loads repo-specific config from it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or
    /// hold invalid values. Missing files are not an error.
    pub fn load(git_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let (global, global_path) = Self::load_global()?;

        let (repo, repo_path_found) = match git_dir {
            Some(path) => Self::load_repo(path)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path: repo_path_found,
        })
    }

    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var("GITPIPE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitpipe/config.toml");
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".gitpipe/config.toml");
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    fn load_repo(git_dir: &Path) -> Result<(Option<RepoConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::repo_config_path(git_dir);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = read_toml(&path)?;
        Ok((Some(config), Some(path)))
    }

    /// Get the canonical path for repo config.
    ///
    /// Returns `gitpipe/config.toml` inside the given git directory, so
    /// subdirectories, linked worktrees and bare repos all find it.
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("gitpipe/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Program to spawn for worker processes.
    ///
    /// Defaults to `git` (looked up on `PATH`).
    pub fn git_binary(&self) -> &str {
        self.global
            .git_binary
            .as_deref()
            .unwrap_or(DEFAULT_GIT_BINARY)
    }

    /// Namespace that short notes ref names are qualified with.
    ///
    /// Repo config wins over global config. Defaults to `refs/notes`.
    /// The returned value never carries a trailing slash.
    pub fn notes_namespace(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.notes_namespace.as_deref())
            .or(self.global.notes_namespace.as_deref())
            .unwrap_or(DEFAULT_NOTES_NAMESPACE)
            .trim_end_matches('/')
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
