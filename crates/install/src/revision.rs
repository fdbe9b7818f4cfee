//! The `.revision` sidecar recording which catalog revision is on disk

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hangar_errors::StorageError;
use hangar_types::Revision;
use tracing::warn;

/// Sidecar file name inside an install directory
pub const REVISION_FILE: &str = ".revision";

#[must_use]
pub fn revision_path(install_path: &Path) -> PathBuf {
    install_path.join(REVISION_FILE)
}

/// Read the installed revision, treating a missing or unreadable sidecar as
/// "not installed"
#[must_use]
pub fn read_revision(install_path: &Path) -> Revision {
    let path = revision_path(install_path);
    match fs::read_to_string(&path) {
        Ok(contents) => contents.parse().unwrap_or_else(|e: StorageError| {
            warn!(path = %path.display(), error = %e, "ignoring malformed revision sidecar");
            Revision::NONE
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Revision::NONE,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read revision sidecar");
            Revision::NONE
        }
    }
}

/// Record `revision` for the install at `install_path`
///
/// # Errors
///
/// Returns a storage error if the sidecar cannot be written.
pub fn write_revision(install_path: &Path, revision: Revision) -> Result<(), StorageError> {
    let path = revision_path(install_path);
    fs::write(&path, revision.to_record()).map_err(|e| StorageError::from_io_with_path(&e, &path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_sidecar_is_not_installed() {
        let temp = tempdir().unwrap();
        assert_eq!(read_revision(temp.path()), Revision::NONE);
    }

    #[test]
    fn write_then_read() {
        let temp = tempdir().unwrap();
        write_revision(temp.path(), Revision::new(12)).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join(".revision")).unwrap(),
            "12\n"
        );
        assert_eq!(read_revision(temp.path()), Revision::new(12));
    }

    #[test]
    fn garbage_reads_as_zero() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(".revision"), "twelve").unwrap();
        assert_eq!(read_revision(temp.path()), Revision::NONE);
    }

    #[test]
    fn write_into_missing_dir_fails() {
        let temp = tempdir().unwrap();
        assert!(write_revision(&temp.path().join("missing"), Revision::new(1)).is_err());
    }
}
