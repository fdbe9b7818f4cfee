//! Configuration sections

use crate::constants;
use hangar_types::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: default_output_format(),
        }
    }
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Root under which `<category>/<directoryName>` installs live
    pub install_root: Option<PathBuf>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Install pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default = "default_max_concurrent_installs")]
    pub max_concurrent_installs: usize,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            max_concurrent_installs: default_max_concurrent_installs(),
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_timeout() -> u64 {
    constants::DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("hangar/{}", env!("CARGO_PKG_VERSION"))
}

fn default_category() -> String {
    constants::DEFAULT_CATEGORY.to_string()
}

fn default_max_concurrent_installs() -> usize {
    constants::DEFAULT_MAX_CONCURRENT_INSTALLS
}
