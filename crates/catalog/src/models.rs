//! Catalog data models

use hangar_errors::{Error, PackageError};
use hangar_types::Revision;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// On-disk catalog document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub packages: Vec<PackageMetadata>,
}

/// Metadata for one package as published by a catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageMetadata {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub revision: Revision,
    /// Lower-case hex MD5 of the package archive
    #[serde(default)]
    pub md5: String,
    /// Directory name the archive unpacks to and the install is named after
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub file_size_bytes: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnails: Vec<String>,
    /// Install-relative thumbnail files
    #[serde(default)]
    pub thumbnail_paths: Vec<String>,
    #[serde(default)]
    pub rating: BTreeMap<String, u32>,
    #[serde(default)]
    pub depends: Vec<DependencySpec>,
    #[serde(default)]
    pub variants: Vec<VariantSpec>,
    /// Per-locale overrides for name and description
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub localized: BTreeMap<String, LocalizedText>,
}

/// Dependency on another package by id with a minimum revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub id: String,
    #[serde(default)]
    pub revision: Revision,
}

/// Alternative variant shipped inside the same package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CatalogFile {
    /// Parse a catalog from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let file: Self = serde_json::from_str(json).map_err(|e| PackageError::InvalidCatalog {
            message: format!("invalid catalog JSON: {e}"),
        })?;
        file.validate()?;
        Ok(file)
    }

    /// Serialize catalog to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be serialized to JSON.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            PackageError::InvalidCatalog {
                message: format!("failed to serialize catalog: {e}"),
            }
            .into()
        })
    }

    /// Check structural invariants: non-empty, unique ids
    ///
    /// # Errors
    ///
    /// Returns an error naming the first violation found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.id.trim().is_empty() {
            return Err(PackageError::InvalidCatalog {
                message: "empty catalog id".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for package in &self.packages {
            if package.id.is_empty() {
                return Err(PackageError::InvalidCatalog {
                    message: format!("empty package id in catalog {}", self.id),
                }
                .into());
            }
            if !seen.insert(package.id.as_str()) {
                return Err(PackageError::InvalidCatalog {
                    message: format!("duplicate package id {} in catalog {}", package.id, self.id),
                }
                .into());
            }
        }

        Ok(())
    }
}

impl PackageMetadata {
    /// Minimal record with the fields the install pipeline needs
    #[must_use]
    pub fn new(id: impl Into<String>, revision: u32, md5: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: Revision::new(revision),
            md5: md5.into(),
            ..Self::default()
        }
    }
}
