//! Integration tests for catalog crate

#[cfg(test)]
mod tests {
    use hangar_catalog::*;
    use hangar_errors::{Error, PackageError};
    use hangar_types::{PackageFilter, Revision};
    use std::collections::HashMap;
    use tempfile::tempdir;

    const CATALOG: &str = r#"{
        "id": "org.acme",
        "packages": [
            {
                "id": "glider",
                "name": "Acme Glider",
                "revision": 3,
                "md5": "d41d8cd98f00b204e9800998ecf8427e",
                "dir": "Glider",
                "urls": ["https://cdn.acme.org/glider.zip"],
                "tags": ["Glider"],
                "depends": [{"id": "instruments", "revision": 2}]
            },
            {
                "id": "instruments",
                "name": "Shared Instruments",
                "revision": 2,
                "md5": "0123456789abcdef0123456789abcdef",
                "dir": "Instruments",
                "urls": ["https://cdn.acme.org/instruments.zip"]
            },
            {
                "id": "needs-new",
                "revision": 1,
                "dir": "NeedsNew",
                "depends": [{"id": "instruments", "revision": 5}]
            },
            {
                "id": "needs-nested",
                "revision": 1,
                "dir": "NeedsNested",
                "depends": [{"id": "glider"}]
            },
            {
                "id": "needs-remote",
                "revision": 1,
                "dir": "NeedsRemote",
                "depends": [{"id": "scenery"}]
            }
        ]
    }"#;

    struct MapResolver(HashMap<String, Package>);

    impl PackageResolver for MapResolver {
        fn package_by_id(&self, id: &str) -> Option<Package> {
            self.0.get(id).cloned()
        }
    }

    fn settings(root: &std::path::Path) -> CatalogSettings {
        CatalogSettings::new(root, "Aircraft")
    }

    fn empty_resolver() -> MapResolver {
        MapResolver(HashMap::new())
    }

    #[test]
    fn test_dependencies_resolve_in_catalog() {
        let catalog = Catalog::from_json(CATALOG, settings("/srv".as_ref())).unwrap();
        let glider = catalog.package_by_id("glider").unwrap();
        let deps = glider.dependencies(&empty_resolver()).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].id(), "instruments");
        assert!(deps[0].ptr_eq(&catalog.package_by_id("instruments").unwrap()));
    }

    #[test]
    fn test_dependency_revision_too_old() {
        let catalog = Catalog::from_json(CATALOG, settings("/srv".as_ref())).unwrap();
        let pkg = catalog.package_by_id("needs-new").unwrap();
        let err = pkg.dependencies(&empty_resolver()).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::DependencyTooOld {
                required: 5,
                available: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_nested_dependency_is_rejected() {
        let catalog = Catalog::from_json(CATALOG, settings("/srv".as_ref())).unwrap();
        let pkg = catalog.package_by_id("needs-nested").unwrap();
        let err = pkg.dependencies(&empty_resolver()).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::NestedDependency { .. })
        ));
    }

    #[test]
    fn test_dependency_falls_back_to_registry() {
        let catalog = Catalog::from_json(CATALOG, settings("/srv".as_ref())).unwrap();
        let pkg = catalog.package_by_id("needs-remote").unwrap();
        assert!(matches!(
            pkg.dependencies(&empty_resolver()).unwrap_err(),
            Error::Package(PackageError::MissingDependency { .. })
        ));

        let other = Catalog::from_json(
            r#"{"id": "org.scenery", "packages": [{"id": "scenery", "revision": 1, "dir": "Scenery"}]}"#,
            settings("/srv".as_ref()),
        )
        .unwrap();
        let resolver = MapResolver(
            [("scenery".to_string(), other.package_by_id("scenery").unwrap())]
                .into_iter()
                .collect(),
        );
        let deps = pkg.dependencies(&resolver).unwrap();
        assert_eq!(deps[0].qualified_id(), "org.scenery.scenery");
    }

    #[test]
    fn test_refresh_updates_handles_in_place() {
        let catalog = Catalog::from_json(CATALOG, settings("/srv".as_ref())).unwrap();
        let held = catalog.package_by_id("glider").unwrap();

        let mut file = CatalogFile::from_json(CATALOG).unwrap();
        file.packages.retain(|p| p.id == "glider");
        file.packages[0].revision = Revision::new(4);
        file.packages[0].tags = vec!["Motorglider".into()];
        catalog.refresh(file).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(held.revision(), Revision::new(4));
        assert!(held.matches(&[PackageFilter::tag("motorglider")]));
        assert!(catalog.package_by_id("instruments").is_none());
    }

    #[test]
    fn test_refresh_rejects_other_catalog() {
        let catalog = Catalog::from_json(CATALOG, settings("/srv".as_ref())).unwrap();
        let file = CatalogFile::from_json(r#"{"id": "org.other"}"#).unwrap();
        assert!(catalog.refresh(file).is_err());
    }

    #[tokio::test]
    async fn test_load_and_installed_filter() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("catalog.json");
        tokio::fs::write(&path, CATALOG).await.unwrap();

        let catalog = Catalog::load(&path, settings(temp.path())).await.unwrap();
        assert_eq!(catalog.category_dir(), temp.path().join("Aircraft"));
        assert!(catalog
            .search(&[PackageFilter::Installed(true)])
            .is_empty());

        std::fs::create_dir_all(temp.path().join("Aircraft").join("Glider")).unwrap();
        let installed = catalog.search(&[PackageFilter::Installed(true)]);
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].id(), "glider");
        assert!(catalog.package_by_dir_name("Glider").is_some());
        assert!(catalog.package_by_dir_name("Nope").is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp = tempdir().unwrap();
        let err = Catalog::load(&temp.path().join("missing.json"), settings(temp.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
