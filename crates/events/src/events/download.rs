use serde::{Deserialize, Serialize};

/// Download-specific events, one stream per install session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// Request handed to the transport
    Requested { url: String, package: String },

    /// Response headers arrived
    Started {
        url: String,
        package: String,
        total_size: Option<u64>,
    },

    /// Body chunk received
    Progress {
        url: String,
        package: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
        percent: u32,
    },

    /// Transfer finished with a response code
    Completed {
        url: String,
        package: String,
        final_size: u64,
        status_code: u16,
    },

    /// Transfer aborted before a response code was available
    Failed {
        url: String,
        package: String,
        bytes_downloaded: u64,
        cancelled: bool,
    },
}
