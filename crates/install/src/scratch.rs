//! Scratch extraction directory

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Guard for the `_extract_<checksum>` directory beside an install target
///
/// Any leftover directory from an interrupted run is purged on construction.
/// A directory created through the guard and not yet removed is removed when
/// the guard drops.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    live: Cell<bool>,
}

impl ScratchDir {
    /// Scratch location for `target`, keyed by the expected checksum
    #[must_use]
    pub fn for_target(target: &Path, checksum: &str) -> Self {
        // Catalog data is untrusted; keep only characters that cannot form a path
        let key: String = checksum
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        let scratch = Self {
            path: parent.join(format!("_extract_{key}")),
            live: Cell::new(false),
        };
        scratch.remove();
        scratch
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the directory, including missing parents
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn create(&self) -> io::Result<()> {
        fs::create_dir_all(&self.path)?;
        self.live.set(true);
        Ok(())
    }

    /// Remove the directory and everything below it, best effort
    pub fn remove(&self) {
        self.live.set(false);
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed scratch directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch directory"
            ),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.live.get() {
            self.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lives_beside_target() {
        let temp = tempdir().unwrap();
        let scratch = ScratchDir::for_target(&temp.path().join("Glider"), "abc123");
        assert_eq!(scratch.path(), temp.path().join("_extract_abc123"));
    }

    #[test]
    fn checksum_cannot_escape_parent() {
        let temp = tempdir().unwrap();
        let scratch = ScratchDir::for_target(&temp.path().join("Glider"), "../../x/y");
        assert_eq!(scratch.path(), temp.path().join("_extract_xy"));
    }

    #[test]
    fn purges_leftovers_and_cleans_up_on_drop() {
        let temp = tempdir().unwrap();
        let leftover = temp.path().join("_extract_d41d");
        fs::create_dir_all(leftover.join("stale")).unwrap();

        let scratch = ScratchDir::for_target(&temp.path().join("Glider"), "d41d");
        assert!(!leftover.exists());

        scratch.create().unwrap();
        fs::write(scratch.path().join("file"), b"x").unwrap();
        drop(scratch);
        assert!(!leftover.exists());
    }

    #[test]
    fn drop_leaves_directories_it_did_not_create() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("Glider");
        let first = ScratchDir::for_target(&target, "d41d");
        first.create().unwrap();
        first.remove();

        let second = ScratchDir::for_target(&target, "d41d");
        second.create().unwrap();
        drop(first);
        assert!(second.exists());
    }
}
