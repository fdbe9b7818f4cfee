//! Package metadata error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum PackageError {
    #[error("package not found: {name}")]
    NotFound { name: String },

    #[error("missing dir property on catalog package entry for {id}")]
    MissingDirectoryName { id: String },

    #[error("invalid dir property {dir:?} on catalog package entry for {id}")]
    InvalidDirectoryName { id: String, dir: String },

    #[error("couldn't satisfy dependency of {package}: {dependency}")]
    MissingDependency { package: String, dependency: String },

    #[error("couldn't find suitable revision of {dependency}: need {required}, have {available}")]
    DependencyTooOld {
        dependency: String,
        required: u32,
        available: u32,
    },

    #[error("nested dependency: {dependency} (required by {package}) has its own dependencies")]
    NestedDependency { package: String, dependency: String },

    #[error("unknown variant {variant} in package {package}")]
    UnknownVariant { package: String, variant: String },

    #[error("invalid catalog: {message}")]
    InvalidCatalog { message: String },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Check the package id or refresh the catalog."),
            Self::MissingDirectoryName { .. }
            | Self::InvalidDirectoryName { .. }
            | Self::NestedDependency { .. }
            | Self::InvalidCatalog { .. } => {
                Some("The catalog entry is malformed; report it to the catalog maintainer.")
            }
            Self::MissingDependency { .. } | Self::DependencyTooOld { .. } => {
                Some("Add or refresh the catalog that provides the dependency.")
            }
            Self::UnknownVariant { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotFound { .. } => "package.not_found",
            Self::MissingDirectoryName { .. } => "package.missing_directory_name",
            Self::InvalidDirectoryName { .. } => "package.invalid_directory_name",
            Self::MissingDependency { .. } => "package.missing_dependency",
            Self::DependencyTooOld { .. } => "package.dependency_too_old",
            Self::NestedDependency { .. } => "package.nested_dependency",
            Self::UnknownVariant { .. } => "package.unknown_variant",
            Self::InvalidCatalog { .. } => "package.invalid_catalog",
        })
    }
}
