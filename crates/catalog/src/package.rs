//! Package handles over catalog metadata

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::rc::{Rc, Weak};

use hangar_errors::{Error, PackageError};
use hangar_types::{PackageFilter, Revision};

use crate::catalog::{Catalog, CatalogContext, CatalogInner};
use crate::models::PackageMetadata;
use crate::PackageResolver;

struct PackageInner {
    context: Rc<CatalogContext>,
    catalog: Weak<CatalogInner>,
    meta: RefCell<PackageMetadata>,
    /// Lower-cased tags, rebuilt whenever metadata changes
    tags: RefCell<BTreeSet<String>>,
}

/// Read-only view of one catalog package
#[derive(Clone)]
pub struct Package(Rc<PackageInner>);

fn lowercase_tags(meta: &PackageMetadata) -> BTreeSet<String> {
    meta.tags.iter().map(|t| t.to_lowercase()).collect()
}

impl Package {
    pub(crate) fn new(
        meta: PackageMetadata,
        context: Rc<CatalogContext>,
        catalog: Weak<CatalogInner>,
    ) -> Self {
        let tags = lowercase_tags(&meta);
        Self(Rc::new(PackageInner {
            context,
            catalog,
            meta: RefCell::new(meta),
            tags: RefCell::new(tags),
        }))
    }

    /// Replace the metadata in place and rebuild cached fields
    pub fn update_from_metadata(&self, meta: PackageMetadata) {
        *self.0.tags.borrow_mut() = lowercase_tags(&meta);
        *self.0.meta.borrow_mut() = meta;
    }

    /// Snapshot of the current metadata
    #[must_use]
    pub fn metadata(&self) -> PackageMetadata {
        self.0.meta.borrow().clone()
    }

    #[must_use]
    pub fn id(&self) -> String {
        self.0.meta.borrow().id.clone()
    }

    #[must_use]
    pub fn catalog_id(&self) -> &str {
        &self.0.context.id
    }

    /// The owning catalog, if it is still loaded
    #[must_use]
    pub fn catalog(&self) -> Option<Catalog> {
        self.0.catalog.upgrade().map(Catalog::from_inner)
    }

    /// `<catalog id>.<package id>`
    #[must_use]
    pub fn qualified_id(&self) -> String {
        format!("{}.{}", self.0.context.id, self.0.meta.borrow().id)
    }

    /// Qualified id of the variant at `index` (0 is the package itself)
    #[must_use]
    pub fn qualified_variant_id(&self, index: usize) -> Option<String> {
        self.variants()
            .get(index)
            .map(|variant| format!("{}.{variant}", self.0.context.id))
    }

    #[must_use]
    pub fn revision(&self) -> Revision {
        self.0.meta.borrow().revision
    }

    /// Expected MD5 hex digest of the archive
    #[must_use]
    pub fn checksum(&self) -> String {
        self.0.meta.borrow().md5.clone()
    }

    /// Directory name of the install
    ///
    /// # Errors
    ///
    /// Returns `PackageError::MissingDirectoryName` if the catalog entry has
    /// no `dir`, and `PackageError::InvalidDirectoryName` if it is anything
    /// other than a single plain path segment.
    pub fn dir_name(&self) -> Result<String, Error> {
        let meta = self.0.meta.borrow();
        match meta.dir.as_deref() {
            Some(dir) if is_single_segment(dir) => Ok(dir.to_string()),
            Some(dir) if !dir.is_empty() => Err(PackageError::InvalidDirectoryName {
                id: meta.id.clone(),
                dir: dir.to_string(),
            }
            .into()),
            _ => Err(PackageError::MissingDirectoryName {
                id: meta.id.clone(),
            }
            .into()),
        }
    }

    #[must_use]
    pub fn download_urls(&self) -> Vec<String> {
        self.0.meta.borrow().urls.clone()
    }

    /// Name, localized for the catalog locale when available
    #[must_use]
    pub fn name(&self) -> String {
        let meta = self.0.meta.borrow();
        self.localized(&meta, |text| text.name.as_ref())
            .unwrap_or_else(|| meta.name.clone())
    }

    /// Description, localized for the catalog locale when available
    #[must_use]
    pub fn description(&self) -> String {
        let meta = self.0.meta.borrow();
        self.localized(&meta, |text| text.description.as_ref())
            .unwrap_or_else(|| meta.description.clone())
    }

    fn localized<F>(&self, meta: &PackageMetadata, field: F) -> Option<String>
    where
        F: Fn(&crate::models::LocalizedText) -> Option<&String>,
    {
        let locale = self.0.context.settings.locale.as_deref()?;
        meta.localized.get(locale).and_then(field).cloned()
    }

    #[must_use]
    pub fn file_size_bytes(&self) -> u64 {
        self.0.meta.borrow().file_size_bytes
    }

    #[must_use]
    pub fn tags(&self) -> BTreeSet<String> {
        self.0.tags.borrow().clone()
    }

    #[must_use]
    pub fn thumbnail_urls(&self) -> Vec<String> {
        self.0.meta.borrow().thumbnails.clone()
    }

    /// Install-relative thumbnail paths
    #[must_use]
    pub fn thumbnails(&self) -> Vec<String> {
        self.0.meta.borrow().thumbnail_paths.clone()
    }

    /// Rating on `axis`; unrated axes count as 0
    #[must_use]
    pub fn rating(&self, axis: &str) -> u32 {
        self.0.meta.borrow().rating.get(axis).copied().unwrap_or(0)
    }

    /// Primary id first, then every declared variant id
    #[must_use]
    pub fn variants(&self) -> Vec<String> {
        let meta = self.0.meta.borrow();
        std::iter::once(meta.id.clone())
            .chain(meta.variants.iter().map(|v| v.id.clone()))
            .collect()
    }

    /// Display name of a variant given its id
    ///
    /// # Errors
    ///
    /// Returns `PackageError::UnknownVariant` if no variant has that id.
    pub fn name_for_variant(&self, variant_id: &str) -> Result<String, Error> {
        if variant_id == self.0.meta.borrow().id {
            return Ok(self.name());
        }

        let meta = self.0.meta.borrow();
        meta.variants
            .iter()
            .find(|v| v.id == variant_id)
            .map(|v| v.name.clone())
            .ok_or_else(|| {
                PackageError::UnknownVariant {
                    package: meta.id.clone(),
                    variant: variant_id.to_string(),
                }
                .into()
            })
    }

    /// Display name of a variant given its index in [`Package::variants`]
    ///
    /// # Errors
    ///
    /// Returns `PackageError::UnknownVariant` if the index is out of range.
    pub fn name_for_variant_index(&self, index: usize) -> Result<String, Error> {
        if index == 0 {
            return Ok(self.name());
        }

        let meta = self.0.meta.borrow();
        meta.variants
            .get(index - 1)
            .map(|v| v.name.clone())
            .ok_or_else(|| {
                PackageError::UnknownVariant {
                    package: meta.id.clone(),
                    variant: format!("#{index}"),
                }
                .into()
            })
    }

    /// `<install root>/<category>/<directory name>`
    ///
    /// # Errors
    ///
    /// Returns an error if the package has no directory name.
    pub fn path_on_disk(&self) -> Result<PathBuf, Error> {
        let settings = &self.0.context.settings;
        Ok(settings
            .install_root
            .join(&settings.category)
            .join(self.dir_name()?))
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.path_on_disk().is_ok_and(|path| path.exists())
    }

    /// True when every filter term holds
    #[must_use]
    pub fn matches(&self, filters: &[PackageFilter]) -> bool {
        filters.iter().all(|filter| self.matches_term(filter))
    }

    fn matches_term(&self, filter: &PackageFilter) -> bool {
        match filter {
            PackageFilter::Tag(tag) => self.0.tags.borrow().contains(&tag.to_lowercase()),
            PackageFilter::Name(needle) => self
                .name()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            PackageFilter::Description(needle) => self
                .description()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            PackageFilter::MinRating { axis, value } => self.rating(axis) >= *value,
            PackageFilter::Installed(expected) => self.is_installed() == *expected,
        }
    }

    /// Resolve declared dependencies, preferring this package's own catalog
    /// and falling back to `registry`.
    ///
    /// # Errors
    ///
    /// Fails if a dependency cannot be found, if the available revision is
    /// older than required, or if a dependency declares dependencies of its
    /// own.
    pub fn dependencies(&self, registry: &dyn PackageResolver) -> Result<Vec<Package>, Error> {
        let (id, depends) = {
            let meta = self.0.meta.borrow();
            (meta.id.clone(), meta.depends.clone())
        };
        let catalog = self.catalog();

        depends
            .into_iter()
            .map(|dep| {
                let package = catalog
                    .as_ref()
                    .and_then(|c| c.package_by_id(&dep.id))
                    .or_else(|| registry.package_by_id(&dep.id))
                    .ok_or_else(|| PackageError::MissingDependency {
                        package: id.clone(),
                        dependency: dep.id.clone(),
                    })?;

                if package.revision() < dep.revision {
                    return Err(PackageError::DependencyTooOld {
                        dependency: dep.id,
                        required: dep.revision.get(),
                        available: package.revision().get(),
                    }
                    .into());
                }

                if !package.0.meta.borrow().depends.is_empty() {
                    return Err(PackageError::NestedDependency {
                        package: id.clone(),
                        dependency: dep.id,
                    }
                    .into());
                }

                Ok(package)
            })
            .collect()
    }

    /// Identity comparison: both handles refer to the same package
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.0.meta.borrow();
        f.debug_struct("Package")
            .field("catalog", &self.0.context.id)
            .field("id", &meta.id)
            .field("revision", &meta.revision)
            .finish_non_exhaustive()
    }
}

/// `dir` must name exactly one directory under the category directory
fn is_single_segment(dir: &str) -> bool {
    if dir.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(dir).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CatalogFile, CatalogSettings, VariantSpec};

    fn catalog_with(packages: Vec<PackageMetadata>) -> Catalog {
        Catalog::new(
            CatalogFile {
                id: "org.acme".into(),
                description: None,
                packages,
            },
            CatalogSettings::new("/srv/hangar", "Aircraft"),
        )
        .unwrap()
    }

    fn glider() -> PackageMetadata {
        PackageMetadata {
            name: "ASK-21 Glider".into(),
            description: "Two-seat training glider".into(),
            dir: Some("ASK21".into()),
            tags: vec!["Glider".into(), "Trainer".into()],
            variants: vec![VariantSpec {
                id: "ask21-mi".into(),
                name: "ASK-21 Mi".into(),
            }],
            ..PackageMetadata::new("ask21", 3, "abc")
        }
    }

    #[test]
    fn tags_are_lowercased() {
        let catalog = catalog_with(vec![glider()]);
        let pkg = catalog.package_by_id("ask21").unwrap();
        assert!(pkg.tags().contains("glider"));
        assert!(pkg.matches(&[PackageFilter::tag("GLIDER")]));
        assert!(!pkg.matches(&[PackageFilter::tag("jet")]));
    }

    #[test]
    fn paths_and_ids() {
        let catalog = catalog_with(vec![glider()]);
        let pkg = catalog.package_by_id("ask21").unwrap();
        assert_eq!(pkg.qualified_id(), "org.acme.ask21");
        assert_eq!(
            pkg.path_on_disk().unwrap(),
            PathBuf::from("/srv/hangar/Aircraft/ASK21")
        );
        assert_eq!(pkg.qualified_variant_id(1).as_deref(), Some("org.acme.ask21-mi"));
        assert_eq!(pkg.qualified_variant_id(2), None);
    }

    #[test]
    fn dir_must_be_a_single_segment() {
        let hostile = ["..", ".", "/etc", "a/../..", "a/b", "..\\evil", "C:\\x"];
        let packages = hostile
            .iter()
            .enumerate()
            .map(|(i, dir)| PackageMetadata {
                dir: Some((*dir).to_string()),
                ..PackageMetadata::new(format!("p{i}"), 1, "x")
            })
            .collect();
        let catalog = catalog_with(packages);

        for (i, dir) in hostile.iter().enumerate() {
            let pkg = catalog.package_by_id(&format!("p{i}")).unwrap();
            assert!(
                matches!(
                    pkg.dir_name(),
                    Err(Error::Package(PackageError::InvalidDirectoryName { .. }))
                ),
                "{dir} should be rejected"
            );
            assert!(pkg.path_on_disk().is_err());
            assert!(!pkg.is_installed());
        }
    }

    #[test]
    fn missing_dir_is_an_error() {
        let catalog = catalog_with(vec![PackageMetadata::new("nodir", 1, "x")]);
        let pkg = catalog.package_by_id("nodir").unwrap();
        assert!(matches!(
            pkg.dir_name(),
            Err(Error::Package(PackageError::MissingDirectoryName { .. }))
        ));
        assert!(pkg.path_on_disk().is_err());
        assert!(!pkg.is_installed());
    }

    #[test]
    fn variants_and_names() {
        let catalog = catalog_with(vec![glider()]);
        let pkg = catalog.package_by_id("ask21").unwrap();
        assert_eq!(pkg.variants(), vec!["ask21", "ask21-mi"]);
        assert_eq!(pkg.name_for_variant("ask21").unwrap(), "ASK-21 Glider");
        assert_eq!(pkg.name_for_variant("ask21-mi").unwrap(), "ASK-21 Mi");
        assert_eq!(pkg.name_for_variant_index(1).unwrap(), "ASK-21 Mi");
        assert!(pkg.name_for_variant("ask13").is_err());
        assert!(pkg.name_for_variant_index(5).is_err());
    }

    #[test]
    fn substring_and_rating_filters() {
        let mut meta = glider();
        meta.rating.insert("fdm".into(), 4);
        let catalog = catalog_with(vec![meta]);
        let pkg = catalog.package_by_id("ask21").unwrap();

        assert!(pkg.matches(&[PackageFilter::name("ask")]));
        assert!(pkg.matches(&[PackageFilter::Description("TRAINING".into())]));
        assert!(pkg.matches(&[PackageFilter::min_rating("fdm", 4)]));
        assert!(!pkg.matches(&[PackageFilter::min_rating("fdm", 5)]));
        assert!(!pkg.matches(&[PackageFilter::min_rating("cockpit", 1)]));
        assert!(pkg.matches(&[PackageFilter::Installed(false)]));
        assert!(!pkg.matches(&[PackageFilter::name("ask"), PackageFilter::tag("jet")]));
        assert!(pkg.matches(&[]));
    }

    #[test]
    fn update_rebuilds_tags() {
        let catalog = catalog_with(vec![glider()]);
        let pkg = catalog.package_by_id("ask21").unwrap();
        let mut meta = glider();
        meta.tags = vec!["Aerobatic".into()];
        pkg.update_from_metadata(meta);
        assert!(pkg.tags().contains("aerobatic"));
        assert!(!pkg.tags().contains("glider"));
    }

    #[test]
    fn localized_description() {
        let mut meta = glider();
        meta.localized.insert(
            "de".into(),
            crate::LocalizedText {
                name: None,
                description: Some("Doppelsitziger Schulsegler".into()),
            },
        );
        let catalog = Catalog::new(
            CatalogFile {
                id: "org.acme".into(),
                description: None,
                packages: vec![meta],
            },
            CatalogSettings::new("/srv/hangar", "Aircraft").with_locale("de"),
        )
        .unwrap();
        let pkg = catalog.package_by_id("ask21").unwrap();
        assert_eq!(pkg.description(), "Doppelsitziger Schulsegler");
        assert_eq!(pkg.name(), "ASK-21 Glider");
    }
}
