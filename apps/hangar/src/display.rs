//! Output rendering and formatting

use std::io;
use std::path::PathBuf;

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use hangar_catalog::Package;
use hangar_install::Install;
use hangar_types::{InstallStatus, Revision};
use serde_json::json;

use crate::events::format_size;

/// Final state of one requested install
pub struct InstallOutcome {
    pub package: String,
    pub revision: Revision,
    pub status: InstallStatus,
    pub path: PathBuf,
    /// Nothing was downloaded because the installed revision is current
    pub up_to_date: bool,
}

impl InstallOutcome {
    pub fn from_install(install: &Install, up_to_date: bool) -> Self {
        Self {
            package: install.package().qualified_id(),
            revision: install.installed_revision(),
            status: if up_to_date {
                InstallStatus::Success
            } else {
                install.status()
            },
            path: install.path().to_path_buf(),
            up_to_date,
        }
    }
}

/// Output renderer for CLI results
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    fn print_json(value: &serde_json::Value) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    fn table(headers: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(
                headers
                    .iter()
                    .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
            );
        table
    }

    pub fn render_install_outcomes(&self, outcomes: &[InstallOutcome]) -> io::Result<()> {
        if self.json_output {
            let rows: Vec<_> = outcomes
                .iter()
                .map(|o| {
                    json!({
                        "package": o.package,
                        "revision": o.revision,
                        "status": o.status,
                        "path": o.path,
                        "upToDate": o.up_to_date,
                    })
                })
                .collect();
            return Self::print_json(&json!({ "installs": rows }));
        }

        let mut table = Self::table(&["Package", "Revision", "Status", "Path"]);
        for outcome in outcomes {
            let status = if outcome.up_to_date {
                Cell::new("up to date").fg(Color::Green)
            } else {
                format_status(outcome.status)
            };
            table.add_row(vec![
                Cell::new(&outcome.package),
                Cell::new(outcome.revision),
                status,
                Cell::new(outcome.path.display()),
            ]);
        }
        println!("{table}");
        Ok(())
    }

    pub fn render_status(&self, installs: &[Install]) -> io::Result<()> {
        if self.json_output {
            let rows: Vec<_> = installs
                .iter()
                .map(|i| {
                    json!({
                        "package": i.package().qualified_id(),
                        "installedRevision": i.installed_revision(),
                        "availableRevision": i.package().revision(),
                        "hasUpdate": i.has_update(),
                        "path": i.path(),
                    })
                })
                .collect();
            return Self::print_json(&json!({ "installed": rows }));
        }

        if installs.is_empty() {
            println!("No packages installed.");
            return Ok(());
        }
        let mut table = Self::table(&["Package", "Installed", "Available", "Path"]);
        for install in installs {
            let available = if install.has_update() {
                Cell::new(install.package().revision()).fg(Color::Yellow)
            } else {
                Cell::new(install.package().revision())
            };
            table.add_row(vec![
                Cell::new(install.package().qualified_id()),
                Cell::new(install.installed_revision()),
                available,
                Cell::new(install.path().display()),
            ]);
        }
        println!("{table}");
        Ok(())
    }

    pub fn render_search_results(&self, packages: &[Package]) -> io::Result<()> {
        if self.json_output {
            let rows: Vec<_> = packages
                .iter()
                .map(|p| {
                    json!({
                        "id": p.qualified_id(),
                        "name": p.name(),
                        "revision": p.revision(),
                        "tags": p.tags(),
                        "installed": p.is_installed(),
                    })
                })
                .collect();
            return Self::print_json(&json!({ "packages": rows }));
        }

        if packages.is_empty() {
            println!("No packages found.");
            return Ok(());
        }
        let mut table = Self::table(&["Package", "Name", "Revision", "Installed"]);
        for package in packages {
            table.add_row(vec![
                Cell::new(package.qualified_id()),
                Cell::new(package.name()),
                Cell::new(package.revision()),
                Cell::new(if package.is_installed() { "yes" } else { "" }),
            ]);
        }
        println!("{table}");
        Ok(())
    }

    pub fn render_package_info(&self, package: &Package, install: Option<&Install>) -> io::Result<()> {
        let installed = install.map(Install::installed_revision);
        if self.json_output {
            return Self::print_json(&json!({
                "id": package.qualified_id(),
                "name": package.name(),
                "description": package.description(),
                "revision": package.revision(),
                "installedRevision": installed,
                "size": package.file_size_bytes(),
                "tags": package.tags(),
                "variants": package.variants(),
                "urls": package.download_urls(),
            }));
        }

        println!("{}", package.name());
        println!("  Id:        {}", package.qualified_id());
        println!("  Revision:  {}", package.revision());
        if let Some(installed) = installed {
            println!("  Installed: {installed}");
        }
        if package.file_size_bytes() > 0 {
            println!("  Size:      {}", format_size(package.file_size_bytes()));
        }
        let tags = package.tags();
        if !tags.is_empty() {
            let tags: Vec<_> = tags.into_iter().collect();
            println!("  Tags:      {}", tags.join(", "));
        }
        let description = package.description();
        if !description.is_empty() {
            println!();
            println!("{description}");
        }
        Ok(())
    }

    pub fn render_success_message(&self, message: &str) -> io::Result<()> {
        if self.json_output {
            Self::print_json(&json!({ "message": message }))
        } else {
            println!("{message}");
            Ok(())
        }
    }
}

fn format_status(status: InstallStatus) -> Cell {
    let cell = Cell::new(status);
    match status {
        InstallStatus::Success => cell.fg(Color::Green),
        InstallStatus::InProgress => cell.fg(Color::Cyan),
        InstallStatus::UserCancelled => cell.fg(Color::Yellow),
        _ => cell.fg(Color::Red),
    }
}
