//! Installation pipeline error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum InstallError {
    #[error("no download URLs for package: {package}")]
    MissingDownloadUrl { package: String },

    #[error("download failed: {url} (HTTP {status})")]
    DownloadFailed { url: String, status: u16 },

    #[error("not found on server: {url}")]
    NotFound { url: String },

    #[error("transfer aborted: {url}")]
    TransferAborted { url: String },

    #[error("checksum mismatch for {package}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        package: String,
        expected: String,
        actual: String,
    },

    #[error("unsafe archive entry rejected: {entry}")]
    UnsafeArchivePath { entry: String },

    #[error("extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("installation cancelled by user")]
    Cancelled,

    #[error("package not installed: {package}")]
    PackageNotInstalled { package: String },
}

impl InstallError {
    /// Shorthand for a failed filesystem operation on `path`
    pub fn filesystem(
        operation: impl Into<String>,
        path: &std::path::Path,
        err: &std::io::Error,
    ) -> Self {
        Self::FilesystemError {
            operation: operation.into(),
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            // Internal scratch paths stay out of the user message
            Self::FilesystemError { operation, .. } => {
                Cow::Owned(format!("filesystem operation failed: {operation}"))
            }
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingDownloadUrl { .. } => {
                Some("The catalog entry lists no download URL; refresh the catalog.")
            }
            Self::DownloadFailed { .. } | Self::TransferAborted { .. } => {
                Some("Check your network connection and retry the install.")
            }
            Self::NotFound { .. } => Some("The catalog may be stale; refresh it and retry."),
            Self::ChecksumMismatch { .. } => {
                Some("The download was corrupted or tampered with; retry the install.")
            }
            Self::UnsafeArchivePath { .. } => {
                Some("The package archive is unsafe; report it to the catalog maintainer.")
            }
            Self::FilesystemError { .. } => {
                Some("Ensure the install directory is writable and has free space.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DownloadFailed { .. }
                | Self::TransferAborted { .. }
                | Self::ChecksumMismatch { .. }
                | Self::Cancelled
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::MissingDownloadUrl { .. } => "install.missing_download_url",
            Self::DownloadFailed { .. } => "install.download_failed",
            Self::NotFound { .. } => "install.not_found",
            Self::TransferAborted { .. } => "install.transfer_aborted",
            Self::ChecksumMismatch { .. } => "install.checksum_mismatch",
            Self::UnsafeArchivePath { .. } => "install.unsafe_archive_path",
            Self::ExtractionFailed { .. } => "install.extraction_failed",
            Self::FilesystemError { .. } => "install.filesystem",
            Self::Cancelled => "install.cancelled",
            Self::PackageNotInstalled { .. } => "install.not_installed",
        })
    }
}
