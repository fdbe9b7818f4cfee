//! Catalog handles

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use hangar_errors::{Error, PackageError};
use hangar_types::PackageFilter;

use crate::models::{CatalogFile, PackageMetadata};
use crate::package::Package;
use crate::PackageResolver;

/// Where a catalog's packages are installed and how their text is localized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    pub install_root: PathBuf,
    /// Category directory under the install root, e.g. `Aircraft`
    pub category: String,
    pub locale: Option<String>,
}

impl CatalogSettings {
    #[must_use]
    pub fn new(install_root: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        Self {
            install_root: install_root.into(),
            category: category.into(),
            locale: None,
        }
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// Immutable per-catalog data shared with every package
#[derive(Debug)]
pub(crate) struct CatalogContext {
    pub(crate) id: String,
    pub(crate) settings: CatalogSettings,
}

pub(crate) struct CatalogInner {
    context: Rc<CatalogContext>,
    packages: RefCell<Vec<Package>>,
}

/// A loaded catalog; cloning shares the same packages
#[derive(Clone)]
pub struct Catalog(Rc<CatalogInner>);

impl Catalog {
    /// Build a catalog from an already-parsed document
    ///
    /// # Errors
    ///
    /// Returns an error if the document fails validation.
    pub fn new(file: CatalogFile, settings: CatalogSettings) -> Result<Self, Error> {
        file.validate()?;
        let context = Rc::new(CatalogContext {
            id: file.id,
            settings,
        });

        let inner = Rc::new_cyclic(|weak: &Weak<CatalogInner>| {
            let packages = file
                .packages
                .into_iter()
                .map(|meta| Package::new(meta, context.clone(), weak.clone()))
                .collect();
            CatalogInner {
                context: context.clone(),
                packages: RefCell::new(packages),
            }
        });

        tracing::debug!(
            catalog = %inner.context.id,
            packages = inner.packages.borrow().len(),
            "catalog loaded"
        );
        Ok(Self(inner))
    }

    /// Parse a catalog from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json(json: &str, settings: CatalogSettings) -> Result<Self, Error> {
        Self::new(CatalogFile::from_json(json)?, settings)
    }

    /// Load a catalog file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path, settings: CatalogSettings) -> Result<Self, Error> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        Self::from_json(&json, settings)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.0.context.id
    }

    #[must_use]
    pub fn settings(&self) -> &CatalogSettings {
        &self.0.context.settings
    }

    #[must_use]
    pub fn install_root(&self) -> &Path {
        &self.0.context.settings.install_root
    }

    /// `<install root>/<category>`, the parent of every install path
    #[must_use]
    pub fn category_dir(&self) -> PathBuf {
        let settings = &self.0.context.settings;
        settings.install_root.join(&settings.category)
    }

    #[must_use]
    pub fn packages(&self) -> Vec<Package> {
        self.0.packages.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.packages.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.packages.borrow().is_empty()
    }

    /// Find the package whose directory name equals `dir_name`
    #[must_use]
    pub fn package_by_dir_name(&self, dir_name: &str) -> Option<Package> {
        self.0
            .packages
            .borrow()
            .iter()
            .find(|p| p.dir_name().is_ok_and(|d| d == dir_name))
            .cloned()
    }

    /// Packages matching every filter term
    #[must_use]
    pub fn search(&self, filters: &[PackageFilter]) -> Vec<Package> {
        self.0
            .packages
            .borrow()
            .iter()
            .filter(|p| p.matches(filters))
            .cloned()
            .collect()
    }

    /// Apply a reloaded document. Existing packages are updated in place,
    /// new ones are added and packages no longer listed are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the document fails validation or names a
    /// different catalog.
    pub fn refresh(&self, file: CatalogFile) -> Result<(), Error> {
        file.validate()?;
        if file.id != self.0.context.id {
            return Err(PackageError::InvalidCatalog {
                message: format!(
                    "refresh of catalog {} with document for {}",
                    self.0.context.id, file.id
                ),
            }
            .into());
        }

        let previous = self.packages();
        let weak = Rc::downgrade(&self.0);
        let updated: Vec<Package> = file
            .packages
            .into_iter()
            .map(|meta| {
                if let Some(existing) = previous.iter().find(|p| p.id() == meta.id) {
                    existing.update_from_metadata(meta);
                    existing.clone()
                } else {
                    Package::new(meta, self.0.context.clone(), weak.clone())
                }
            })
            .collect();

        tracing::debug!(
            catalog = %self.0.context.id,
            before = previous.len(),
            after = updated.len(),
            "catalog refreshed"
        );
        *self.0.packages.borrow_mut() = updated;
        Ok(())
    }

    pub(crate) fn from_inner(inner: Rc<CatalogInner>) -> Self {
        Self(inner)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PackageResolver for Catalog {
    fn package_by_id(&self, id: &str) -> Option<Package> {
        self.0
            .packages
            .borrow()
            .iter()
            .find(|p| p.id() == id)
            .cloned()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("id", &self.0.context.id)
            .field("packages", &self.len())
            .finish()
    }
}
