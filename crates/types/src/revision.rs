//! Package revision numbers

use hangar_errors::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Monotonically increasing content revision assigned by a catalog.
///
/// Revision `0` means "not installed".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(u32);

impl Revision {
    /// The revision of a package that has never been installed
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Render in sidecar record form: the integer followed by a newline
    #[must_use]
    pub fn to_record(self) -> String {
        format!("{}\n", self.0)
    }
}

impl From<u32> for Revision {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Revision {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|e| StorageError::CorruptedData {
                message: format!("invalid revision record {s:?}: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record_with_trailing_newline() {
        let rev: Revision = "3\n".parse().unwrap();
        assert_eq!(rev, Revision::new(3));
        assert_eq!(rev.to_record(), "3\n");
    }

    #[test]
    fn rejects_garbage() {
        assert!("three".parse::<Revision>().is_err());
        assert!("".parse::<Revision>().is_err());
        assert!("-1".parse::<Revision>().is_err());
    }

    #[test]
    fn ordering_follows_integer() {
        assert!(Revision::new(4) > Revision::new(3));
        assert!(Revision::NONE.is_none());
        assert_eq!(Revision::default(), Revision::NONE);
    }
}
