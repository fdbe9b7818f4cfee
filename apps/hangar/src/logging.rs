//! Tracing setup and structured logging of lifecycle events

use std::path::PathBuf;

use hangar_config::constants::APP_DIR;
use hangar_events::{AppEvent, DownloadEvent, EventMeta, InstallEvent};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,hangar=debug,hangar_install=debug";

fn log_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("logs")
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber.
///
/// Debug runs write JSON logs to a timestamped file. Otherwise warnings go
/// to stderr, except in JSON mode where stdout and stderr stay clean.
pub fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        let dir = log_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            if !json_mode {
                eprintln!("Warning: Failed to create log directory: {e}");
            }
        }
        let log_file = dir.join(format!(
            "hangar-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));
        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(env_filter(DEFAULT_FILTER))
                    .init();
                return;
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
            }
        }
    }

    if json_mode {
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_env_filter(env_filter("warn"))
            .init();
    }
}

/// Record an event in the log with its metadata as structured fields
pub fn log_event(event: &AppEvent, meta: &EventMeta) {
    let level = meta.tracing_level();
    let source = meta.source.as_str();
    let correlation = meta.correlation_id.as_deref().unwrap_or_default();

    match event {
        AppEvent::Install(InstallEvent::Failed {
            package,
            status,
            failure,
        }) => {
            error!(
                source,
                event_id = %meta.event_id,
                package = %package,
                status = %status,
                code = ?failure.code,
                retryable = failure.retryable,
                message = %failure.message,
                "install failed"
            );
        }
        AppEvent::Install(InstallEvent::Completed {
            package,
            revision,
            install_path,
            entries_extracted,
        }) => {
            info!(
                source,
                event_id = %meta.event_id,
                package = %package,
                revision = %revision,
                path = %install_path.display(),
                entries = entries_extracted,
                "install completed"
            );
        }
        AppEvent::Download(DownloadEvent::Progress {
            package,
            bytes_downloaded,
            total_bytes,
            ..
        }) => {
            debug!(
                source,
                package = %package,
                bytes = bytes_downloaded,
                total = ?total_bytes,
                "download progress"
            );
        }
        _ => {
            let payload = serde_json::to_string(event).unwrap_or_default();
            if level == Level::ERROR {
                error!(source, correlation, event = %payload, "event");
            } else if level == Level::WARN {
                warn!(source, correlation, event = %payload, "event");
            } else if level == Level::INFO {
                info!(source, correlation, event = %payload, "event");
            } else {
                debug!(source, correlation, event = %payload, "event");
            }
        }
    }
}
