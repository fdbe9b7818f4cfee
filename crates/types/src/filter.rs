//! Catalog search filters

use serde::{Deserialize, Serialize};

/// One term of a catalog search. A package matches a filter list only when
/// every term holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PackageFilter {
    /// Case-insensitive exact tag membership
    Tag(String),
    /// Case-insensitive substring of the package name
    Name(String),
    /// Case-insensitive substring of the package description
    Description(String),
    /// Rating on `axis` (missing ratings count as 0) must be at least `value`
    MinRating { axis: String, value: u32 },
    /// Installed state must equal the given flag
    Installed(bool),
}

impl PackageFilter {
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    #[must_use]
    pub fn name(needle: impl Into<String>) -> Self {
        Self::Name(needle.into())
    }

    #[must_use]
    pub fn min_rating(axis: impl Into<String>, value: u32) -> Self {
        Self::MinRating {
            axis: axis.into(),
            value,
        }
    }
}
