//! The install registry: catalogs, installs and the concurrency queue

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use hangar_catalog::{Catalog, CatalogSettings, Package, PackageResolver};
use hangar_config::Config;
use hangar_errors::Error;
use hangar_events::{AppEvent, DownloadEvent, EventEmitter, EventSender, InstallEvent};
use hangar_net::{Request, Transport};
use hangar_types::InstallStatus;
use tracing::{debug, info, warn};

use crate::install::Install;
use crate::registry::Registry;

/// Subscriber told whenever a package gains a new install
pub type PackageInstallCallback = Rc<dyn Fn(&Package, &Install)>;

/// Owns every registered catalog and install, and limits how many sessions
/// run at once.
///
/// Installs beyond the limit wait in a FIFO queue and start as running
/// sessions finish.
pub struct Root {
    settings: CatalogSettings,
    max_concurrent: usize,
    transport: Rc<dyn Transport>,
    events: Option<EventSender>,
    catalogs: RefCell<Vec<Catalog>>,
    installs: RefCell<Vec<Install>>,
    running: RefCell<Vec<Install>>,
    queue: RefCell<VecDeque<Install>>,
    install_callbacks: RefCell<Vec<(String, PackageInstallCallback)>>,
}

impl Root {
    /// A registry installing under `settings` with at most `max_concurrent`
    /// sessions in flight. A limit of zero is treated as one.
    pub fn new(
        settings: CatalogSettings,
        max_concurrent: usize,
        transport: Rc<dyn Transport>,
        events: Option<EventSender>,
    ) -> Rc<Self> {
        Rc::new(Self {
            settings,
            max_concurrent: max_concurrent.max(1),
            transport,
            events,
            catalogs: RefCell::new(Vec::new()),
            installs: RefCell::new(Vec::new()),
            running: RefCell::new(Vec::new()),
            queue: RefCell::new(VecDeque::new()),
            install_callbacks: RefCell::new(Vec::new()),
        })
    }

    /// A registry configured from the install and path sections of `config`
    pub fn from_config(
        config: &Config,
        transport: Rc<dyn Transport>,
        events: Option<EventSender>,
    ) -> Rc<Self> {
        let settings =
            CatalogSettings::new(config.install_root(), config.install.default_category.clone());
        Self::new(
            settings,
            config.install.max_concurrent_installs,
            transport,
            events,
        )
    }

    #[must_use]
    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Directory that holds one subdirectory per installed package
    #[must_use]
    pub fn category_dir(&self) -> PathBuf {
        self.settings.install_root.join(&self.settings.category)
    }

    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn add_catalog(&self, catalog: Catalog) {
        let mut catalogs = self.catalogs.borrow_mut();
        if let Some(existing) = catalogs.iter_mut().find(|c| c.id() == catalog.id()) {
            debug!(catalog = %catalog.id(), "replacing registered catalog");
            *existing = catalog;
        } else {
            info!(catalog = %catalog.id(), packages = catalog.len(), "catalog registered");
            catalogs.push(catalog);
        }
    }

    #[must_use]
    pub fn catalogs(&self) -> Vec<Catalog> {
        self.catalogs.borrow().clone()
    }

    #[must_use]
    pub fn catalog_by_id(&self, id: &str) -> Option<Catalog> {
        self.catalogs.borrow().iter().find(|c| c.id() == id).cloned()
    }

    #[must_use]
    pub fn installs(&self) -> Vec<Install> {
        self.installs.borrow().clone()
    }

    #[must_use]
    pub fn existing_install_for_package(&self, package: &Package) -> Option<Install> {
        let id = package.qualified_id();
        self.installs
            .borrow()
            .iter()
            .find(|install| install.package().qualified_id() == id)
            .cloned()
    }

    /// Installs waiting for a free slot, oldest first
    #[must_use]
    pub fn queued_installs(&self) -> Vec<Install> {
        self.queue.borrow().iter().cloned().collect()
    }

    #[must_use]
    pub fn running_installs(&self) -> usize {
        self.running.borrow().len()
    }

    /// Create and register an install for `package` at its location on disk
    ///
    /// # Errors
    ///
    /// Fails when the package has no directory name.
    pub fn create_install(self: &Rc<Self>, package: &Package) -> Result<Install, Error> {
        let path = package.path_on_disk()?;
        let registry: Rc<dyn Registry> = self.clone();
        Ok(Install::new(package.clone(), path, &registry))
    }

    /// Register installs for every directory under the category directory
    /// that `catalog` recognises. Returns the newly adopted installs.
    pub fn adopt_existing_installs(self: &Rc<Self>, catalog: &Catalog) -> Vec<Install> {
        let dir = catalog.category_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "no installed packages to adopt");
                return Vec::new();
            }
        };

        let registry: Rc<dyn Registry> = self.clone();
        let mut adopted = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(package) = catalog.package_by_dir_name(&name) else {
                continue;
            };
            if self.existing_install_for_package(&package).is_some() {
                continue;
            }
            match Install::create_from_path(&path, catalog, &registry) {
                Ok(install) => adopted.push(install),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to adopt install"),
            }
        }
        info!(catalog = %catalog.id(), adopted = adopted.len(), "adopted existing installs");
        adopted
    }

    /// Start `install` now if a slot is free, otherwise queue it.
    ///
    /// Installs that are already downloading or queued are left alone.
    ///
    /// # Errors
    ///
    /// Propagates a failure to start the session.
    pub fn schedule_to_update(&self, install: &Install) -> Result<(), Error> {
        if install.is_downloading() || self.is_install_queued(install) {
            return Ok(());
        }

        if self.running.borrow().len() < self.max_concurrent {
            return install.start_update();
        }

        let position = {
            let mut queue = self.queue.borrow_mut();
            queue.push_back(install.clone());
            queue.len()
        };
        info!(
            package = %install.package().qualified_id(),
            queue_position = position,
            "install queued"
        );
        self.emit(AppEvent::Install(InstallEvent::Queued {
            package: install.package().qualified_id(),
            queue_position: position,
        }));
        Ok(())
    }

    /// Subscribe to new installs of the package with `qualified_id`
    pub fn add_install_callback(
        &self,
        qualified_id: impl Into<String>,
        callback: PackageInstallCallback,
    ) {
        self.install_callbacks
            .borrow_mut()
            .push((qualified_id.into(), callback));
    }

    pub(crate) fn fire_install_callbacks(&self, package: &Package, install: &Install) {
        let id = package.qualified_id();
        let callbacks: Vec<PackageInstallCallback> = self
            .install_callbacks
            .borrow()
            .iter()
            .filter(|(pid, _)| *pid == id)
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(package, install);
        }
    }

    fn start_next_queued(&self) {
        while self.running.borrow().len() < self.max_concurrent {
            let next = self.queue.borrow_mut().pop_front();
            let Some(next) = next else {
                break;
            };
            if let Err(e) = next.start_update() {
                warn!(
                    package = %next.package().qualified_id(),
                    error = %e,
                    "failed to start queued install"
                );
                self.emit_warning_with_context(
                    "failed to start queued install",
                    next.package().qualified_id(),
                );
            }
        }
    }
}

impl EventEmitter for Root {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl PackageResolver for Root {
    /// Resolves `catalog.package` ids first, then bare ids across catalogs
    /// in registration order
    fn package_by_id(&self, id: &str) -> Option<Package> {
        let catalogs = self.catalogs.borrow();
        let qualified = catalogs.iter().find_map(|catalog| {
            id.strip_prefix(catalog.id())
                .and_then(|rest| rest.strip_prefix('.'))
                .and_then(|rest| catalog.package_by_id(rest))
        });
        qualified.or_else(|| catalogs.iter().find_map(|c| c.package_by_id(id)))
    }
}

impl Registry for Root {
    fn events(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }

    fn register_install(&self, install: &Install) {
        let mut installs = self.installs.borrow_mut();
        if installs.iter().any(|i| i.ptr_eq(install)) {
            return;
        }
        installs.push(install.clone());
        drop(installs);
        self.emit(AppEvent::Install(InstallEvent::Registered {
            package: install.package().qualified_id(),
            path: install.path().to_path_buf(),
        }));
    }

    fn unregister_install(&self, install: &Install) {
        self.installs.borrow_mut().retain(|i| !i.ptr_eq(install));
        self.queue.borrow_mut().retain(|i| !i.ptr_eq(install));
        self.emit(AppEvent::Install(InstallEvent::Unregistered {
            package: install.package().qualified_id(),
        }));
    }

    fn start_install(&self, install: &Install, request: Request) {
        {
            let mut running = self.running.borrow_mut();
            if !running.iter().any(|i| i.ptr_eq(install)) {
                running.push(install.clone());
            }
        }
        self.emit(AppEvent::Download(DownloadEvent::Requested {
            url: request.url(),
            package: install.package().qualified_id(),
        }));
        self.transport.submit(request);
    }

    fn install_progress(&self, install: &Install, bytes_downloaded: u64, total: Option<u64>) {
        let url = install.download_url().unwrap_or_default();
        let percent = install.downloaded_percent().unwrap_or_default();
        self.emit_download_progress(
            url,
            install.package().qualified_id(),
            bytes_downloaded,
            total,
            percent,
        );
    }

    fn finish_install(&self, install: &Install, status: InstallStatus) {
        self.running.borrow_mut().retain(|i| !i.ptr_eq(install));
        debug!(
            package = %install.package().qualified_id(),
            status = %status,
            running = self.running.borrow().len(),
            "session finished"
        );
        self.start_next_queued();
    }

    fn cancel_install(&self, install: &Install) {
        self.queue.borrow_mut().retain(|i| !i.ptr_eq(install));
    }

    fn is_install_queued(&self, install: &Install) -> bool {
        self.queue.borrow().iter().any(|i| i.ptr_eq(install))
    }
}
