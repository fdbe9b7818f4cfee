//! Install entry points on catalog packages

use std::rc::Rc;

use hangar_catalog::Package;
use hangar_errors::Error;
use tracing::{debug, warn};

use crate::install::Install;
use crate::registry::Registry;
use crate::root::Root;

/// Install operations for [`Package`], which lives in the catalog crate and
/// knows nothing about the registry
pub trait PackageInstallExt {
    /// Return the package's install, creating and scheduling one if needed.
    ///
    /// Subscribers added through [`PackageInstallExt::existing_install`] are
    /// told about a newly created install.
    ///
    /// # Errors
    ///
    /// Fails when the package has no directory name or its session cannot
    /// start.
    fn install(&self, root: &Rc<Root>) -> Result<Install, Error>;

    /// Subscribe `callback` to installs of this package and return the
    /// current install, if any. The callback also runs immediately when an
    /// install already exists.
    fn existing_install(
        &self,
        root: &Root,
        callback: impl Fn(&Package, &Install) + 'static,
    ) -> Option<Install>;
}

impl PackageInstallExt for Package {
    fn install(&self, root: &Rc<Root>) -> Result<Install, Error> {
        if let Some(existing) = root.existing_install_for_package(self) {
            debug!(package = %self.qualified_id(), "package already has an install");
            return Ok(existing);
        }

        let install = root.create_install(self)?;
        if let Err(e) = root.schedule_to_update(&install) {
            warn!(package = %self.qualified_id(), error = %e, "install could not be scheduled");
            root.unregister_install(&install);
            return Err(e);
        }
        root.fire_install_callbacks(self, &install);
        Ok(install)
    }

    fn existing_install(
        &self,
        root: &Root,
        callback: impl Fn(&Package, &Install) + 'static,
    ) -> Option<Install> {
        let callback: Rc<dyn Fn(&Package, &Install)> = Rc::new(callback);
        root.add_install_callback(self.qualified_id(), Rc::clone(&callback));
        let existing = root.existing_install_for_package(self);
        if let Some(install) = &existing {
            callback(self, install);
        }
        existing
    }
}
