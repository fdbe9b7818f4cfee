//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hangar - install packages published in JSON catalogs
#[derive(Parser)]
#[command(name = "hangar")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Install and update packages from a package catalog")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write debug logs to the hangar log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Catalog file to read packages from
    #[arg(long, global = true, value_name = "PATH", env = "HANGAR_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Override the install root directory
    #[arg(long, global = true, value_name = "DIR")]
    pub install_root: Option<PathBuf>,

    /// Maximum number of concurrent downloads
    #[arg(long, global = true, value_name = "N")]
    pub jobs: Option<usize>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Install or update packages
    #[command(alias = "i")]
    Install {
        /// Package ids, optionally qualified with the catalog id
        #[arg(required = true)]
        packages: Vec<String>,

        /// Skip installing dependencies
        #[arg(long)]
        no_deps: bool,
    },

    /// Remove installed packages
    #[command(alias = "rm")]
    Uninstall {
        /// Package ids
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Show installed packages and pending updates
    #[command(alias = "ls")]
    Status {
        /// Only show this package
        package: Option<String>,
    },

    /// Show information about a package
    Info {
        /// Package id
        package: String,
    },

    /// Search the catalog
    #[command(alias = "find")]
    Search {
        /// Package tag, matched case-insensitively
        #[arg(long)]
        tag: Vec<String>,

        /// Substring of the package name
        #[arg(long)]
        name: Option<String>,

        /// Substring of the description
        #[arg(long)]
        description: Option<String>,

        /// Minimum rating as AXIS=VALUE, e.g. cockpit=3
        #[arg(long, value_name = "AXIS=VALUE")]
        min_rating: Vec<String>,

        /// Only installed packages
        #[arg(long, conflicts_with = "not_installed")]
        installed: bool,

        /// Only packages that are not installed
        #[arg(long)]
        not_installed: bool,
    },
}

impl Commands {
    /// Short command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install { .. } => "install",
            Self::Uninstall { .. } => "uninstall",
            Self::Status { .. } => "status",
            Self::Info { .. } => "info",
            Self::Search { .. } => "search",
        }
    }
}
