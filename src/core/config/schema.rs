//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$GITPIPE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitpipe/config.toml`
//! 3. `~/.gitpipe/config.toml`
//!
//! # Repo Config
//!
//! Located at `gitpipe/config.toml` inside the git directory.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// git_binary = "/usr/local/bin/git"
/// notes_namespace = "refs/notes"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Program spawned for every worker process (default: `git`)
    pub git_binary: Option<String>,

    /// Namespace used to qualify short notes ref names
    pub notes_namespace: Option<String>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(binary) = &self.git_binary {
            if binary.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "git_binary cannot be empty".to_string(),
                ));
            }
        }

        if let Some(namespace) = &self.notes_namespace {
            validate_namespace(namespace)?;
        }

        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// notes_namespace = "refs/notes"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Namespace used to qualify short notes ref names
    pub notes_namespace: Option<String>,
}

impl RepoConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(namespace) = &self.notes_namespace {
            validate_namespace(namespace)?;
        }
        Ok(())
    }
}

fn validate_namespace(namespace: &str) -> Result<(), ConfigError> {
    if !namespace.starts_with("refs/") || namespace.trim_end_matches('/') == "refs" {
        return Err(ConfigError::InvalidValue(format!(
            "notes namespace must live under refs/, got '{}'",
            namespace
        )));
    }
    Ok(())
}
