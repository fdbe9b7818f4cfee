#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for hangar
//!
//! Library crates report what they are doing through typed [`AppEvent`]s sent
//! over an unbounded channel; the CLI decides how to render them. Sending
//! never fails the caller: a dropped receiver simply discards events.
//!
//! Events are grouped by domain (general, download, install) and each event
//! knows its tracing level and log target so consumers can bridge them into
//! `tracing` without a per-variant table.

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{AppEvent, DownloadEvent, FailureContext, GeneralEvent, InstallEvent};

use hangar_types::{InstallStatus, Revision};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// Type alias for event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout hangar
///
/// Implemented by anything that may hold a sender; helpers are no-ops when
/// `event_sender` returns `None`.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit a warning event with context
    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    /// Emit a download started event
    fn emit_download_started(
        &self,
        url: impl Into<String>,
        package: impl Into<String>,
        total_size: Option<u64>,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Started {
            url: url.into(),
            package: package.into(),
            total_size,
        }));
    }

    /// Emit a download progress event
    fn emit_download_progress(
        &self,
        url: impl Into<String>,
        package: impl Into<String>,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
        percent: u32,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Progress {
            url: url.into(),
            package: package.into(),
            bytes_downloaded,
            total_bytes,
            percent,
        }));
    }

    /// Emit a download completed event
    fn emit_download_completed(
        &self,
        url: impl Into<String>,
        package: impl Into<String>,
        final_size: u64,
        status_code: u16,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Completed {
            url: url.into(),
            package: package.into(),
            final_size,
            status_code,
        }));
    }

    /// Emit an install started event
    fn emit_install_started(
        &self,
        package: impl Into<String>,
        revision: Revision,
        session_id: impl Into<String>,
    ) {
        self.emit(AppEvent::Install(InstallEvent::Started {
            package: package.into(),
            revision,
            session_id: session_id.into(),
        }));
    }

    /// Emit an install completed event
    fn emit_install_completed(
        &self,
        package: impl Into<String>,
        revision: Revision,
        install_path: PathBuf,
        entries_extracted: usize,
    ) {
        self.emit(AppEvent::Install(InstallEvent::Completed {
            package: package.into(),
            revision,
            install_path,
            entries_extracted,
        }));
    }

    /// Emit an install failed event carrying the user-facing failure context
    fn emit_install_failed(
        &self,
        package: impl Into<String>,
        status: InstallStatus,
        failure: FailureContext,
    ) {
        self.emit(AppEvent::Install(InstallEvent::Failed {
            package: package.into(),
            status,
            failure,
        }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
/// This allows `EventSender` to be used directly where `EventEmitter` is expected
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
