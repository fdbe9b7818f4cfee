use serde::{Deserialize, Serialize};

use crate::EventSource;
use hangar_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod download;
pub mod general;
pub mod install;

pub use download::*;
pub use general::*;
pub use install::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Transfer events for install sessions
    Download(DownloadEvent),

    /// Install lifecycle events
    Install(InstallEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Download(_) => EventSource::DOWNLOAD,
            Self::Install(_) => EventSource::INSTALL,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Install(InstallEvent::Failed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Download(DownloadEvent::Failed {
                cancelled: false, ..
            }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Download(DownloadEvent::Progress { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "hangar::events::general",
            Self::Download(_) => "hangar::events::download",
            Self::Install(_) => "hangar::events::install",
        }
    }

    /// Package id the event concerns, if any
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::General(_) => None,
            Self::Download(
                DownloadEvent::Requested { package, .. }
                | DownloadEvent::Started { package, .. }
                | DownloadEvent::Progress { package, .. }
                | DownloadEvent::Completed { package, .. }
                | DownloadEvent::Failed { package, .. },
            )
            | Self::Install(
                InstallEvent::Registered { package, .. }
                | InstallEvent::Unregistered { package }
                | InstallEvent::Queued { package, .. }
                | InstallEvent::Started { package, .. }
                | InstallEvent::Extracting { package, .. }
                | InstallEvent::Completed { package, .. }
                | InstallEvent::Failed { package, .. }
                | InstallEvent::CancelRequested { package }
                | InstallEvent::Uninstalled { package, .. },
            ) => Some(package),
        }
    }
}
