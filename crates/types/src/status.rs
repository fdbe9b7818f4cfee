//! Install status codes surfaced to callers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of the most recent update attempt on an install.
///
/// A fresh install reports `InProgress` until its first attempt finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallStatus {
    #[default]
    InProgress,
    Success,
    FailDownload,
    FailNotFound,
    FailChecksum,
    FailExtract,
    FailFilesystem,
    UserCancelled,
}

impl InstallStatus {
    /// Terminal states are every state except `InProgress`
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::InProgress | Self::Success)
    }

    /// Map a transport response code onto a failure status
    #[must_use]
    pub const fn from_response_code(code: u16) -> Self {
        match code {
            200 => Self::Success,
            404 => Self::FailNotFound,
            _ => Self::FailDownload,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Success => "SUCCESS",
            Self::FailDownload => "FAIL_DOWNLOAD",
            Self::FailNotFound => "FAIL_NOT_FOUND",
            Self::FailChecksum => "FAIL_CHECKSUM",
            Self::FailExtract => "FAIL_EXTRACT",
            Self::FailFilesystem => "FAIL_FILESYSTEM",
            Self::UserCancelled => "USER_CANCELLED",
        }
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_codes() {
        assert_eq!(InstallStatus::from_response_code(200), InstallStatus::Success);
        assert_eq!(
            InstallStatus::from_response_code(404),
            InstallStatus::FailNotFound
        );
        assert_eq!(
            InstallStatus::from_response_code(500),
            InstallStatus::FailDownload
        );
        assert_eq!(
            InstallStatus::from_response_code(302),
            InstallStatus::FailDownload
        );
    }

    #[test]
    fn terminal_and_failure() {
        assert!(!InstallStatus::InProgress.is_terminal());
        assert!(InstallStatus::Success.is_terminal());
        assert!(!InstallStatus::Success.is_failure());
        assert!(InstallStatus::UserCancelled.is_failure());
        assert!(!InstallStatus::InProgress.is_failure());
    }

    #[test]
    fn serializes_screaming_case() {
        let json = serde_json::to_string(&InstallStatus::FailNotFound).unwrap();
        assert_eq!(json, "\"FAIL_NOT_FOUND\"");
        assert_eq!(InstallStatus::FailChecksum.to_string(), "FAIL_CHECKSUM");
    }
}
