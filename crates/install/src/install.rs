//! Per-package install handle

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use hangar_catalog::{Catalog, Package};
use hangar_errors::{Error, InstallError, PackageError};
use hangar_events::{AppEvent, EventEmitter, EventSender, FailureContext, InstallEvent};
use hangar_net::{CancelHandle, Request};
use hangar_types::{InstallStatus, Revision};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::registry::Registry;
use crate::revision::{read_revision, write_revision};
use crate::session::InstallSession;

/// Subscriber invoked on a terminal transition
pub type InstallCallback = Rc<dyn Fn(&Install)>;

/// Subscriber invoked with `(bytes_downloaded, total_bytes)` for every body
/// chunk; `total_bytes` is `None` when the server sent no length
pub type ProgressCallback = Rc<dyn Fn(&Install, u64, Option<u64>)>;

#[derive(Default)]
struct Subscribers {
    done: Vec<InstallCallback>,
    fail: Vec<InstallCallback>,
    always: Vec<InstallCallback>,
    progress: Vec<ProgressCallback>,
}

struct ActiveSession {
    session: Rc<InstallSession>,
    cancel: CancelHandle,
}

enum SessionSlot {
    Idle,
    Active(ActiveSession),
}

impl SessionSlot {
    fn session(&self) -> Option<&Rc<InstallSession>> {
        match self {
            Self::Idle => None,
            Self::Active(active) => Some(&active.session),
        }
    }

    fn holds(&self, session_id: Uuid) -> bool {
        self.session().is_some_and(|s| s.id() == session_id)
    }
}

struct InstallState {
    revision: Revision,
    status: InstallStatus,
    slot: SessionSlot,
}

pub(crate) struct InstallInner {
    package: Package,
    path: PathBuf,
    registry: Weak<dyn Registry>,
    state: RefCell<InstallState>,
    subscribers: RefCell<Subscribers>,
}

/// The on-disk presence of one package.
///
/// Cheap to clone; all clones share state. At most one download session is
/// active at a time, and subscriber lists are drained after each terminal
/// transition except for progress subscribers, which persist.
#[derive(Clone)]
pub struct Install(Rc<InstallInner>);

/// Non-owning install reference held by sessions
#[derive(Clone)]
pub(crate) struct WeakInstall(Weak<InstallInner>);

impl WeakInstall {
    pub(crate) fn upgrade(&self) -> Option<Install> {
        self.0.upgrade().map(Install)
    }
}

impl Install {
    /// Create an install for `package` at `path` and register it.
    ///
    /// The installed revision is read from the `.revision` sidecar, and is
    /// `0` when there is none.
    pub fn new(package: Package, path: impl Into<PathBuf>, registry: &Rc<dyn Registry>) -> Self {
        let path = path.into();
        let revision = read_revision(&path);
        let install = Self(Rc::new(InstallInner {
            package,
            path,
            registry: Rc::downgrade(registry),
            state: RefCell::new(InstallState {
                revision,
                status: InstallStatus::default(),
                slot: SessionSlot::Idle,
            }),
            subscribers: RefCell::new(Subscribers::default()),
        }));

        debug!(
            package = %install.0.package.qualified_id(),
            path = %install.0.path.display(),
            revision = %revision,
            "install created"
        );
        registry.register_install(&install);
        install
    }

    /// Adopt an existing directory whose final component names a package
    /// directory in `catalog`
    ///
    /// # Errors
    ///
    /// Returns `PackageError::NotFound` when no package claims the directory.
    pub fn create_from_path(
        path: &Path,
        catalog: &Catalog,
        registry: &Rc<dyn Registry>,
    ) -> Result<Self, Error> {
        let dir_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let package = catalog
            .package_by_dir_name(&dir_name)
            .ok_or_else(|| PackageError::NotFound {
                name: dir_name.clone(),
            })?;
        Ok(Self::new(package, path, registry))
    }

    #[must_use]
    pub fn package(&self) -> &Package {
        &self.0.package
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0.path
    }

    #[must_use]
    pub fn installed_revision(&self) -> Revision {
        self.0.state.borrow().revision
    }

    #[must_use]
    pub fn status(&self) -> InstallStatus {
        self.0.state.borrow().status
    }

    /// Whether the catalog carries a newer revision than the one on disk
    #[must_use]
    pub fn has_update(&self) -> bool {
        self.0.package.revision() > self.installed_revision()
    }

    #[must_use]
    pub fn is_downloading(&self) -> bool {
        matches!(self.0.state.borrow().slot, SessionSlot::Active(_))
    }

    #[must_use]
    pub fn is_queued(&self) -> bool {
        self.registry()
            .is_some_and(|registry| registry.is_install_queued(self))
    }

    /// Percentage of the active download received, `None` when idle
    #[must_use]
    pub fn downloaded_percent(&self) -> Option<u32> {
        self.active_session().map(|s| s.percent_downloaded())
    }

    /// Bytes received by the active download, `None` when idle
    #[must_use]
    pub fn downloaded_bytes(&self) -> Option<u64> {
        self.active_session().map(|s| s.bytes_received())
    }

    /// URL the active download is fetching
    #[must_use]
    pub fn download_url(&self) -> Option<String> {
        self.active_session().map(|s| s.url().to_string())
    }

    /// Thumbnails resolved inside the install directory
    #[must_use]
    pub fn thumbnail_paths(&self) -> Vec<PathBuf> {
        self.0
            .package
            .thumbnails()
            .into_iter()
            .map(|relative| self.0.path.join(relative))
            .collect()
    }

    /// Path of the package's primary descriptor, `<path>/<id>-set.xml`
    #[must_use]
    pub fn primary_set_path(&self) -> PathBuf {
        self.0.path.join(format!("{}-set.xml", self.0.package.id()))
    }

    /// Begin downloading the catalog's current revision.
    ///
    /// Does nothing while a session is already active.
    ///
    /// # Errors
    ///
    /// Fails when the package has no download URL or no directory name, or
    /// when the owning registry has been dropped.
    pub fn start_update(&self) -> Result<(), Error> {
        if self.is_downloading() {
            debug!(package = %self.0.package.qualified_id(), "update already in progress");
            return Ok(());
        }

        let registry = self
            .registry()
            .ok_or_else(|| Error::internal("install registry has been dropped"))?;
        let session = InstallSession::new(self)?;
        let request = Request::new(session.clone());
        let session_id = session.id();
        let url = session.url().to_string();
        let revision = session.revision();

        {
            let mut state = self.0.state.borrow_mut();
            state.slot = SessionSlot::Active(ActiveSession {
                session,
                cancel: request.cancel_handle(),
            });
            state.status = InstallStatus::InProgress;
        }

        info!(
            package = %self.0.package.qualified_id(),
            revision = %revision,
            url = %url,
            session_id = %session_id,
            "starting update"
        );
        if let Some(events) = registry.events() {
            events.emit_install_started(
                self.0.package.qualified_id(),
                revision,
                session_id.to_string(),
            );
        }
        registry.start_install(self, request);
        Ok(())
    }

    /// Cancel the active download, if any.
    ///
    /// An install with nothing on disk is also unregistered. The session
    /// itself ends with `USER_CANCELLED` once the transport observes the
    /// cancellation.
    pub fn cancel_download(&self) {
        let cancel = match &self.0.state.borrow().slot {
            SessionSlot::Active(active) => Some(active.cancel.clone()),
            SessionSlot::Idle => None,
        };
        let registry = self.registry();

        if let Some(cancel) = cancel {
            cancel.cancel();
            self.emit(AppEvent::Install(InstallEvent::CancelRequested {
                package: self.0.package.qualified_id(),
            }));
        }

        let Some(registry) = registry else {
            return;
        };
        if self.installed_revision().is_none() {
            info!(
                package = %self.0.package.qualified_id(),
                "cancelled install of package, unregistering"
            );
            registry.unregister_install(self);
        }
        registry.cancel_install(self);
    }

    /// Remove the install directory and unregister.
    ///
    /// A directory that is already gone counts as removed.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::FilesystemError` if removal fails; the install
    /// then stays registered.
    pub fn uninstall(&self) -> Result<(), Error> {
        let path = &self.0.path;
        match fs::remove_dir_all(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "install directory already absent");
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to remove install");
                return Err(InstallError::filesystem("remove install directory", path, &e).into());
            }
        }

        self.0.state.borrow_mut().revision = Revision::NONE;
        info!(package = %self.0.package.qualified_id(), path = %path.display(), "uninstalled");
        if let Some(registry) = self.registry() {
            registry.unregister_install(self);
        }
        self.emit(AppEvent::Install(InstallEvent::Uninstalled {
            package: self.0.package.qualified_id(),
            path: path.clone(),
        }));
        Ok(())
    }

    /// Run `callback` on success; immediately if the last session succeeded
    pub fn done(&self, callback: impl Fn(&Install) + 'static) -> &Self {
        if self.status() == InstallStatus::Success {
            callback(self);
        } else {
            self.0.subscribers.borrow_mut().done.push(Rc::new(callback));
        }
        self
    }

    /// Run `callback` on failure; immediately if the last session failed
    pub fn fail(&self, callback: impl Fn(&Install) + 'static) -> &Self {
        if self.status().is_failure() {
            callback(self);
        } else {
            self.0.subscribers.borrow_mut().fail.push(Rc::new(callback));
        }
        self
    }

    /// Run `callback` on any terminal transition; immediately if one has
    /// already happened
    pub fn always(&self, callback: impl Fn(&Install) + 'static) -> &Self {
        if self.status().is_terminal() {
            callback(self);
        } else {
            self.0.subscribers.borrow_mut().always.push(Rc::new(callback));
        }
        self
    }

    /// Run `callback` for every received body chunk of every session
    pub fn progress(&self, callback: impl Fn(&Install, u64, Option<u64>) + 'static) -> &Self {
        self.0
            .subscribers
            .borrow_mut()
            .progress
            .push(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> WeakInstall {
        WeakInstall(Rc::downgrade(&self.0))
    }

    pub(crate) fn registry(&self) -> Option<Rc<dyn Registry>> {
        self.0.registry.upgrade()
    }

    pub(crate) fn events(&self) -> Option<EventSender> {
        self.registry()
            .and_then(|registry| registry.events().cloned())
    }

    pub(crate) fn emit(&self, event: AppEvent) {
        if let Some(events) = self.events() {
            events.emit(event);
        }
    }

    fn active_session(&self) -> Option<Rc<InstallSession>> {
        self.0.state.borrow().slot.session().cloned()
    }

    pub(crate) fn notify_progress(&self, bytes_downloaded: u64, total: Option<u64>) {
        if let Some(registry) = self.registry() {
            registry.install_progress(self, bytes_downloaded, total);
        }
        let callbacks = self.0.subscribers.borrow().progress.clone();
        for callback in callbacks {
            callback(self, bytes_downloaded, total);
        }
    }

    pub(crate) fn session_succeeded(&self, session_id: Uuid, revision: Revision, entries: usize) {
        if !self.take_session(session_id, InstallStatus::Success) {
            return;
        }
        self.0.state.borrow_mut().revision = revision;

        if let Err(e) = write_revision(&self.0.path, revision) {
            warn!(
                path = %self.0.path.display(),
                error = %e,
                "failed to record installed revision"
            );
            if let Some(events) = self.events() {
                events.emit_warning_with_context(
                    format!(
                        "{} installed but its revision was not recorded",
                        self.0.package.qualified_id()
                    ),
                    e.to_string(),
                );
            }
        }

        info!(
            package = %self.0.package.qualified_id(),
            revision = %revision,
            path = %self.0.path.display(),
            "package installed"
        );
        if let Some(events) = self.events() {
            events.emit_install_completed(
                self.0.package.qualified_id(),
                revision,
                self.0.path.clone(),
                entries,
            );
        }
        self.install_result(InstallStatus::Success);
    }

    pub(crate) fn session_failed(
        &self,
        session_id: Uuid,
        status: InstallStatus,
        failure: &InstallError,
    ) {
        if !self.take_session(session_id, status) {
            return;
        }

        if status == InstallStatus::UserCancelled {
            info!(package = %self.0.package.qualified_id(), "install cancelled");
        } else {
            error!(
                package = %self.0.package.qualified_id(),
                status = %status,
                error = %failure,
                "install failed"
            );
        }
        if let Some(events) = self.events() {
            events.emit_install_failed(
                self.0.package.qualified_id(),
                status,
                FailureContext::from_error(failure),
            );
        }
        self.install_result(status);
    }

    /// Clear the slot if it still holds `session_id` and record `status`
    fn take_session(&self, session_id: Uuid, status: InstallStatus) -> bool {
        let mut state = self.0.state.borrow_mut();
        if !state.slot.holds(session_id) {
            debug!(session_id = %session_id, "ignoring result of a stale session");
            return false;
        }
        state.slot = SessionSlot::Idle;
        state.status = status;
        true
    }

    /// Report to the registry, then drain and run the matching subscribers.
    /// `done` survives a failure and `fail` survives a success.
    fn install_result(&self, status: InstallStatus) {
        if let Some(registry) = self.registry() {
            registry.finish_install(self, status);
        }

        let (outcome, always) = {
            let mut subscribers = self.0.subscribers.borrow_mut();
            let outcome = if status == InstallStatus::Success {
                std::mem::take(&mut subscribers.done)
            } else {
                std::mem::take(&mut subscribers.fail)
            };
            (outcome, std::mem::take(&mut subscribers.always))
        };

        for callback in outcome.iter().chain(always.iter()) {
            callback(self);
        }
    }
}

impl fmt::Debug for Install {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.borrow();
        f.debug_struct("Install")
            .field("package", &self.0.package.qualified_id())
            .field("path", &self.0.path)
            .field("revision", &state.revision)
            .field("status", &state.status)
            .field("downloading", &matches!(state.slot, SessionSlot::Active(_)))
            .finish()
    }
}
