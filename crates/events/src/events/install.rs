use hangar_types::{InstallStatus, Revision};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;

/// Installation domain events - emitted by the install registry and pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    /// Install registered with the registry
    Registered { package: String, path: PathBuf },

    /// Install removed from the registry
    Unregistered { package: String },

    /// Install waiting for a free session slot
    Queued {
        package: String,
        queue_position: usize,
    },

    /// Session started for a package revision
    Started {
        package: String,
        revision: Revision,
        session_id: String,
    },

    /// Archive verified and being extracted into the scratch directory
    Extracting {
        package: String,
        scratch_path: PathBuf,
    },

    /// Installation committed successfully
    Completed {
        package: String,
        revision: Revision,
        install_path: PathBuf,
        entries_extracted: usize,
    },

    /// Installation attempt ended in a failure status
    Failed {
        package: String,
        status: InstallStatus,
        failure: FailureContext,
    },

    /// Cancellation requested by the user
    CancelRequested { package: String },

    /// Package content removed from disk
    Uninstalled { package: String, path: PathBuf },
}
