//! The seam between installs and whatever owns them

use hangar_catalog::PackageResolver;
use hangar_events::EventSender;
use hangar_net::Request;
use hangar_types::InstallStatus;

use crate::Install;

/// Owner of a set of installs.
///
/// An [`Install`] only holds a weak reference to its registry and reports
/// every lifecycle step through this trait. Implementations are called with
/// no install state borrowed, so they may call back into the install.
pub trait Registry: PackageResolver {
    /// Channel for lifecycle events, if anyone is listening
    fn events(&self) -> Option<&EventSender>;

    /// A new install exists for a package
    fn register_install(&self, install: &Install);

    fn unregister_install(&self, install: &Install);

    /// Hand a session's request to the transport
    fn start_install(&self, install: &Install, request: Request);

    /// Body bytes arrived for the install's active session
    fn install_progress(&self, install: &Install, bytes_downloaded: u64, total: Option<u64>);

    /// The active session reached a terminal status. Called before any
    /// subscriber callback runs.
    fn finish_install(&self, install: &Install, status: InstallStatus);

    /// Drop any queued but unstarted work for the install
    fn cancel_install(&self, install: &Install);

    fn is_install_queued(&self, install: &Install) -> bool;
}
