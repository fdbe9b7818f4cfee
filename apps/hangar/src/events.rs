//! Event handling and progress display

use std::collections::HashMap;

use console::style;
use hangar_events::{AppEvent, DownloadEvent, EventMeta, GeneralEvent, InstallEvent};
use hangar_types::InstallStatus;

use crate::logging::log_event;

/// Turns lifecycle events into log records and user feedback on stderr
pub struct EventHandler {
    json: bool,
    /// Last progress step shown per package
    progress: HashMap<String, u32>,
}

impl EventHandler {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            progress: HashMap::new(),
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        let meta = EventMeta::for_event(&event);
        log_event(&event, &meta);

        if self.json {
            let line = serde_json::json!({ "meta": meta, "event": event });
            eprintln!("{line}");
            return;
        }

        match event {
            AppEvent::Install(event) => self.handle_install(event),
            AppEvent::Download(event) => self.handle_download(event),
            AppEvent::General(GeneralEvent::Warning { message, context }) => match context {
                Some(context) => show_warning(&format!("{message} ({context})")),
                None => show_warning(&message),
            },
            AppEvent::General(GeneralEvent::Error { message, details }) => {
                show_error(&message);
                if let Some(details) = details {
                    eprintln!("  {details}");
                }
            }
            AppEvent::General(_) => {}
        }
    }

    fn handle_install(&mut self, event: InstallEvent) {
        match event {
            InstallEvent::Queued {
                package,
                queue_position,
            } => show_status(&format!("Queued {package} (position {queue_position})")),
            InstallEvent::Started {
                package, revision, ..
            } => {
                self.progress.remove(&package);
                show_status(&format!("Installing {package} revision {revision}"));
            }
            InstallEvent::Extracting { package, .. } => {
                show_status(&format!("Extracting {package}"));
            }
            InstallEvent::Completed {
                package, revision, ..
            } => {
                eprintln!(
                    "{} Installed {package} revision {revision}",
                    style("✓").green()
                );
            }
            InstallEvent::Failed {
                package,
                status,
                failure,
            } => {
                if status == InstallStatus::UserCancelled {
                    show_warning(&format!("Cancelled {package}"));
                } else {
                    show_error(&format!("{package}: {} ({status})", failure.message));
                    if let Some(hint) = failure.hint {
                        eprintln!("  Hint: {hint}");
                    }
                }
            }
            InstallEvent::Uninstalled { package, .. } => {
                show_status(&format!("Removed {package}"));
            }
            InstallEvent::Registered { .. }
            | InstallEvent::Unregistered { .. }
            | InstallEvent::CancelRequested { .. } => {}
        }
    }

    fn handle_download(&mut self, event: DownloadEvent) {
        if let DownloadEvent::Progress {
            package,
            bytes_downloaded,
            total_bytes,
            percent,
            ..
        } = event
        {
            // One line per ten percent
            let step = percent / 10;
            let last = self.progress.entry(package.clone()).or_insert(0);
            if step > *last {
                *last = step;
                let total = total_bytes.map_or_else(|| "?".to_string(), format_size);
                eprintln!(
                    "  {package}: {percent:>3}% ({} of {total})",
                    format_size(bytes_downloaded)
                );
            }
        }
    }
}

fn show_status(message: &str) {
    eprintln!("{} {message}", style("::").cyan().bold());
}

fn show_warning(message: &str) {
    eprintln!("{} {message}", style("warning:").yellow().bold());
}

fn show_error(message: &str) {
    eprintln!("{} {message}", style("error:").red().bold());
}

/// Format byte size in human readable format
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{size:.0} {}", UNITS[unit_index])
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
