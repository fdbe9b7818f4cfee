#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for hangar
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/hangar/config.toml)
//! - Environment variables
//! - CLI flags

pub mod constants;
pub mod core;

pub use core::{GeneralConfig, InstallConfig, NetworkConfig, PathConfig};

use hangar_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub install: InstallConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::APP_DIR)
            .join(constants::CONFIG_FILE))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::ReadError {
                    path: path.display().to_string(),
                    error: e.to_string(),
                }
            }
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!("no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value that cannot be parsed.
    pub fn merge_vars<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(constants::ENV_INSTALL_ROOT) {
            if root.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: constants::ENV_INSTALL_ROOT.to_string(),
                    value: root,
                }
                .into());
            }
            self.paths.install_root = Some(PathBuf::from(root));
        }

        if let Some(max) = lookup(constants::ENV_MAX_CONCURRENT_INSTALLS) {
            self.install.max_concurrent_installs =
                max.parse().map_err(|_| ConfigError::InvalidValue {
                    field: constants::ENV_MAX_CONCURRENT_INSTALLS.to_string(),
                    value: max,
                })?;
        }

        if let Some(timeout) = lookup(constants::ENV_NETWORK_TIMEOUT) {
            self.network.timeout = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: constants::ENV_NETWORK_TIMEOUT.to_string(),
                value: timeout,
            })?;
        }

        Ok(())
    }

    /// Reject values the install pipeline cannot work with
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.install.max_concurrent_installs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "install.max_concurrent_installs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        let category = self.install.default_category.trim();
        if category.is_empty() || category.contains(['/', '\\']) || category == ".." {
            return Err(ConfigError::InvalidValue {
                field: "install.default_category".to_string(),
                value: self.install.default_category.clone(),
            }
            .into());
        }

        if self.network.timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.timeout".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Get the install root (with default)
    #[must_use]
    pub fn install_root(&self) -> PathBuf {
        self.paths.install_root.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
                .unwrap_or_else(|| PathBuf::from("."))
                .join(constants::APP_DIR)
                .join("packages")
        })
    }

    /// Directory packages of the default category are installed into
    #[must_use]
    pub fn category_dir(&self) -> PathBuf {
        self.install_root().join(&self.install.default_category)
    }

    #[must_use]
    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout)
    }
}
