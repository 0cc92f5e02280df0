//! Configuration management for dbactl
//!
//! Handles configuration loading from files and environment variables.
//! Configuration is stored in TOML format with support for multiple named
//! connection profiles and an overridable state directory.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};

/// Environment variable naming an alternate configuration file
pub const ENV_CONFIG_FILE: &str = "DBACTL_CONFIG_FILE";

/// Environment variable overriding the state directory
pub const ENV_STATE_DIR: &str = "DBACTL_STATE_DIR";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when a command does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Directory holding the metadata file and sandbox instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual connection profile
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Connection string of the shape `<user>[:<password>]@<host>:<port>`
    pub connection: String,
}

impl Config {
    /// Load configuration from the standard location, honoring
    /// `DBACTL_CONFIG_FILE` when set.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(ENV_CONFIG_FILE) {
            return Self::load_from_path(Path::new(&path));
        }
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Resolve a profile, falling back to the configured default.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<&Profile> {
        let name = match name.or(self.default_profile.as_deref()) {
            Some(name) => name,
            None => {
                return Err(ConfigError::NoProfiles {
                    suggestion: "Pass a connection string or set default_profile in the config."
                        .to_string(),
                });
            }
        };

        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve the state directory: environment override, then the config
    /// file, then the platform data directory.
    pub fn resolve_state_dir(&self) -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
            return Ok(PathBuf::from(dir));
        }
        if let Some(dir) = &self.state_dir {
            return Ok(dir.clone());
        }
        let proj_dirs =
            ProjectDirs::from("io", "dbactl", "dbactl").ok_or(ConfigError::StateDirError)?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("io", "dbactl", "dbactl").ok_or(ConfigError::ConfigDirError)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references in config content.
    ///
    /// Unset variables are left unexpanded so profiles that are never
    /// resolved do not fail the load.
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}
