//! hangar - catalog-driven package installer
//!
//! Loads a catalog, adopts packages already present under the install root
//! and drives install sessions over HTTP. Everything runs on one thread
//! inside a [`tokio::task::LocalSet`].

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{InstallOutcome, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use crate::logging::init_tracing;
use clap::Parser;
use hangar_catalog::{Catalog, Package, PackageResolver};
use hangar_config::Config;
use hangar_errors::{InstallError, PackageError};
use hangar_events::EventReceiver;
use hangar_install::{Install, PackageInstallExt, Root};
use hangar_net::{HttpTransport, NetConfig};
use hangar_types::PackageFilter;
use std::process;
use std::rc::Rc;
use tokio::select;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    let local = tokio::task::LocalSet::new();
    if let Err(e) = local.run_until(run(cli)).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting hangar v{}", env!("CARGO_PKG_VERSION"));

    // File config (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global)?;
    config.validate()?;

    let catalog_path = cli.global.catalog.clone().ok_or_else(|| {
        CliError::InvalidArguments(
            "no catalog given; pass --catalog or set HANGAR_CATALOG".to_string(),
        )
    })?;

    let (event_sender, event_receiver) = hangar_events::channel();
    let transport = HttpTransport::with_config(&NetConfig::from(&config.network))?;
    let root = Root::from_config(&config, Rc::new(transport), Some(event_sender));

    let catalog = Catalog::load(&catalog_path, root.settings().clone()).await?;
    root.add_catalog(catalog.clone());
    root.adopt_existing_installs(&catalog);

    let renderer = OutputRenderer::new(cli.global.json);
    let mut event_handler = EventHandler::new(cli.global.json);

    let command = cli.command.name();
    execute_command_with_events(
        cli.command,
        &root,
        &catalog,
        renderer,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    info!(command, "Command completed successfully");
    Ok(())
}

fn apply_cli_config(config: &mut Config, global: &GlobalArgs) -> Result<(), CliError> {
    if let Some(root) = &global.install_root {
        config.paths.install_root = Some(root.clone());
    }
    if let Some(jobs) = global.jobs {
        if jobs == 0 {
            return Err(CliError::InvalidArguments(
                "--jobs must be at least 1".to_string(),
            ));
        }
        config.install.max_concurrent_installs = jobs;
    }
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    root: &Rc<Root>,
    catalog: &Catalog,
    renderer: OutputRenderer,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<(), CliError> {
    let mut command_future = Box::pin(execute_command(command, root, catalog, renderer));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    root: &Rc<Root>,
    catalog: &Catalog,
    renderer: OutputRenderer,
) -> Result<(), CliError> {
    match command {
        Commands::Install { packages, no_deps } => {
            let outcomes = install_packages(root, &packages, no_deps).await?;
            renderer.render_install_outcomes(&outcomes)?;
            let failed = outcomes.iter().filter(|o| o.status.is_failure()).count();
            if failed > 0 {
                return Err(CliError::InstallsFailed(failed));
            }
            Ok(())
        }

        Commands::Uninstall { packages } => {
            for id in &packages {
                let package = resolve(root, id)?;
                let install = root.existing_install_for_package(&package).ok_or_else(|| {
                    hangar_errors::Error::from(InstallError::PackageNotInstalled {
                        package: package.qualified_id(),
                    })
                })?;
                install.uninstall()?;
            }
            renderer.render_success_message(&format!("Removed {} package(s)", packages.len()))?;
            Ok(())
        }

        Commands::Status { package } => {
            let mut installs = root.installs();
            if let Some(id) = package {
                let package = resolve(root, &id)?;
                installs.retain(|i| i.package().qualified_id() == package.qualified_id());
            }
            installs.sort_by_key(|i| i.package().qualified_id());
            renderer.render_status(&installs)?;
            Ok(())
        }

        Commands::Info { package } => {
            let package = resolve(root, &package)?;
            let install = root.existing_install_for_package(&package);
            renderer.render_package_info(&package, install.as_ref())?;
            Ok(())
        }

        Commands::Search {
            tag,
            name,
            description,
            min_rating,
            installed,
            not_installed,
        } => {
            let mut filters: Vec<PackageFilter> = tag.into_iter().map(PackageFilter::tag).collect();
            if let Some(name) = name {
                filters.push(PackageFilter::name(name));
            }
            if let Some(description) = description {
                filters.push(PackageFilter::Description(description));
            }
            for term in &min_rating {
                filters.push(parse_min_rating(term)?);
            }
            if installed {
                filters.push(PackageFilter::Installed(true));
            } else if not_installed {
                filters.push(PackageFilter::Installed(false));
            }
            renderer.render_search_results(&catalog.search(&filters))?;
            Ok(())
        }
    }
}

fn resolve(root: &Root, id: &str) -> Result<Package, CliError> {
    root.package_by_id(id).ok_or_else(|| {
        CliError::Hangar(
            PackageError::NotFound {
                name: id.to_string(),
            }
            .into(),
        )
    })
}

fn parse_min_rating(term: &str) -> Result<PackageFilter, CliError> {
    let invalid = || CliError::InvalidArguments(format!("expected AXIS=VALUE, got {term}"));
    let (axis, value) = term.split_once('=').ok_or_else(invalid)?;
    let value = value.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok(PackageFilter::min_rating(axis.trim(), value))
}

/// Requested packages plus their dependencies, dependencies first
fn install_plan(root: &Root, ids: &[String], no_deps: bool) -> Result<Vec<Package>, CliError> {
    let mut plan: Vec<Package> = Vec::new();
    let mut push = |package: Package| {
        if !plan.iter().any(|p| p.qualified_id() == package.qualified_id()) {
            plan.push(package);
        }
    };

    for id in ids {
        let package = resolve(root, id)?;
        if !no_deps {
            for dependency in package.dependencies(root)? {
                push(dependency);
            }
        }
        push(package);
    }
    Ok(plan)
}

/// Start every needed session and wait for all of them to settle
async fn install_packages(
    root: &Rc<Root>,
    ids: &[String],
    no_deps: bool,
) -> Result<Vec<InstallOutcome>, CliError> {
    let plan = install_plan(root, ids, no_deps)?;
    let (settled_tx, mut settled_rx) = mpsc::unbounded_channel::<()>();

    let mut tracked: Vec<(Install, bool)> = Vec::new();
    let mut pending = 0_usize;
    for package in &plan {
        let install = match root.existing_install_for_package(package) {
            Some(install) => {
                if install.has_update() {
                    root.schedule_to_update(&install)?;
                }
                install
            }
            None => package.install(root)?,
        };

        if install.is_downloading() || install.is_queued() {
            let tx = settled_tx.clone();
            install.always(move |_| {
                let _ = tx.send(());
            });
            pending += 1;
            tracked.push((install, false));
        } else {
            tracked.push((install, true));
        }
    }

    let mut cancelled = false;
    while pending > 0 {
        select! {
            settled = settled_rx.recv() => {
                if settled.is_none() {
                    break;
                }
                pending -= 1;
            }
            _ = tokio::signal::ctrl_c(), if !cancelled => {
                warn!("interrupted, cancelling downloads");
                cancelled = true;
                for (install, _) in &tracked {
                    if install.is_downloading() || install.is_queued() {
                        install.cancel_download();
                    }
                }
                // Queued installs never start, so nothing will settle them
                while settled_rx.try_recv().is_ok() {}
                pending = tracked
                    .iter()
                    .filter(|(install, _)| install.is_downloading())
                    .count();
            }
        }
    }

    Ok(tracked
        .iter()
        .map(|(install, up_to_date)| InstallOutcome::from_install(install, *up_to_date))
        .collect())
}
