#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package catalogs for hangar
//!
//! A catalog is a named list of package metadata records. Parsing is a thin
//! serde layer over [`CatalogFile`]; everything else here is the read-only
//! view the install pipeline needs: [`Package`] handles with cached tags,
//! dependency resolution and search filtering.
//!
//! Packages are cheap reference-counted handles. Refreshing a catalog updates
//! its packages in place, so every holder observes the new metadata.

mod catalog;
mod models;
mod package;

pub use catalog::{Catalog, CatalogSettings};
pub use models::{CatalogFile, DependencySpec, LocalizedText, PackageMetadata, VariantSpec};
pub use package::Package;

/// Resolves package ids to packages.
///
/// Implemented by catalogs and by the install registry, which searches every
/// registered catalog.
pub trait PackageResolver {
    fn package_by_id(&self, id: &str) -> Option<Package>;
}
