//! Fixed names and defaults shared by the config sections

/// Directory under the platform data/config dirs
pub const APP_DIR: &str = "hangar";
pub const CONFIG_FILE: &str = "config.toml";

/// Category directory packages land in unless configured otherwise
pub const DEFAULT_CATEGORY: &str = "Aircraft";

pub const DEFAULT_MAX_CONCURRENT_INSTALLS: usize = 2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub const ENV_INSTALL_ROOT: &str = "HANGAR_INSTALL_ROOT";
pub const ENV_MAX_CONCURRENT_INSTALLS: &str = "HANGAR_MAX_CONCURRENT_INSTALLS";
pub const ENV_NETWORK_TIMEOUT: &str = "HANGAR_NETWORK_TIMEOUT";
