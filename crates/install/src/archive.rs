//! Zip extraction with entry path validation
//!
//! Archives come from catalogs we do not control. Every entry name is
//! validated before anything is written, and a single bad entry aborts the
//! whole extraction.

use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use hangar_errors::InstallError;
use tracing::{debug, warn};
use zip::ZipArchive;

/// What an extraction wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Regular files written
    pub files: usize,
    /// Directory placeholders and empty entries skipped
    pub skipped: usize,
    /// Decompressed bytes written
    pub bytes: u64,
}

impl ExtractSummary {
    #[must_use]
    pub fn entries(&self) -> usize {
        self.files + self.skipped
    }
}

/// Validates that an archive entry name stays inside the extraction root
///
/// Rejected:
/// - empty names and names containing NUL
/// - absolute names, in either separator style, and drive prefixes
/// - any `..` component, in either separator style
///
/// # Errors
///
/// Returns `InstallError::UnsafeArchivePath` naming the entry.
pub fn validate_entry_name(name: &str) -> Result<(), InstallError> {
    let unsafe_entry = || InstallError::UnsafeArchivePath {
        entry: name.to_string(),
    };

    if name.is_empty() || name.contains('\0') {
        return Err(unsafe_entry());
    }

    if name.starts_with('/') || name.starts_with('\\') {
        return Err(unsafe_entry());
    }

    // "C:foo" or "C:\foo" style prefixes
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Err(unsafe_entry());
    }

    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(unsafe_entry());
    }

    for component in Path::new(name).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_entry());
            }
        }
    }

    Ok(())
}

/// Map a validated entry name onto a relative path, accepting both
/// separator styles
fn relative_entry_path(name: &str) -> PathBuf {
    name.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}

/// Unpacks an in-memory zip archive under a destination root
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    dest: PathBuf,
}

impl ArchiveExtractor {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }

    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Extract every entry of `buffer`. An empty buffer is an archive with
    /// no entries.
    ///
    /// # Errors
    ///
    /// Returns `UnsafeArchivePath` for a rejected entry name and
    /// `ExtractionFailed` for any format or I/O error. Files written before
    /// the failure are left for the caller to discard.
    pub fn extract(&self, buffer: &[u8]) -> Result<ExtractSummary, InstallError> {
        let mut summary = ExtractSummary::default();
        if buffer.is_empty() {
            debug!(dest = %self.dest.display(), "empty archive, nothing to extract");
            return Ok(summary);
        }

        let mut archive =
            ZipArchive::new(Cursor::new(buffer)).map_err(|e| InstallError::ExtractionFailed {
                message: format!("failed to read zip archive: {e}"),
            })?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| InstallError::ExtractionFailed {
                    message: format!("failed to read zip entry {i}: {e}"),
                })?;
            let name = entry.name().to_string();

            if let Err(err) = validate_entry_name(&name) {
                warn!(
                    security = true,
                    entry = %name,
                    dest = %self.dest.display(),
                    "rejected unsafe archive entry"
                );
                return Err(err);
            }

            // Zero-length entries are directory placeholders; parents are
            // created on demand below
            if entry.is_dir() || name.ends_with(['/', '\\']) || entry.size() == 0 {
                summary.skipped += 1;
                continue;
            }

            let outpath = self.dest.join(relative_entry_path(&name));
            if let Some(parent) = outpath.parent() {
                if !parent.exists() {
                    fs::create_dir_all(parent).map_err(|e| InstallError::ExtractionFailed {
                        message: format!("failed to create directory for {name}: {e}"),
                    })?;
                }
            }

            let mut outfile = File::create(&outpath).map_err(|e| InstallError::ExtractionFailed {
                message: format!("failed to open {name} for writing: {e}"),
            })?;
            let written =
                std::io::copy(&mut entry, &mut outfile).map_err(|e| {
                    InstallError::ExtractionFailed {
                        message: format!("failed to extract {name}: {e}"),
                    }
                })?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if entry.unix_mode().is_some_and(|mode| mode & 0o111 != 0) {
                    let _ = fs::set_permissions(&outpath, fs::Permissions::from_mode(0o755));
                }
            }

            summary.files += 1;
            summary.bytes += written;
        }

        debug!(
            dest = %self.dest.display(),
            files = summary.files,
            bytes = summary.bytes,
            "archive extracted"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn accepts_ordinary_names() {
        for name in ["Glider/glider-set.xml", "a/b/c.txt", "./x", "Models\\body.ac", "dots..name"] {
            assert!(validate_entry_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_unsafe_names() {
        for name in [
            "/etc/passwd",
            "\\windows\\system32",
            "../../evil",
            "Glider/../../evil",
            "Glider\\..\\..\\evil",
            "..",
            "C:\\evil",
            "",
        ] {
            assert!(
                matches!(
                    validate_entry_name(name),
                    Err(InstallError::UnsafeArchivePath { .. })
                ),
                "{name}"
            );
        }
    }

    #[test]
    fn extracts_nested_files_and_skips_placeholders() {
        let temp = tempdir().unwrap();
        let archive = zip_of(&[
            ("Glider/", b""),
            ("Glider/Models/", b""),
            ("Glider/glider-set.xml", b"<PropertyList/>"),
            ("Glider/Models/body.ac", b"AC3Db"),
            ("Glider/empty.txt", b""),
        ]);

        let summary = ArchiveExtractor::new(temp.path()).extract(&archive).unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.entries(), 5);
        assert_eq!(
            fs::read(temp.path().join("Glider/Models/body.ac")).unwrap(),
            b"AC3Db"
        );
        assert!(!temp.path().join("Glider/empty.txt").exists());
    }

    #[test]
    fn existing_files_are_truncated() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("Glider")).unwrap();
        fs::write(temp.path().join("Glider/a.txt"), b"much longer old content").unwrap();

        let archive = zip_of(&[("Glider/a.txt", b"new")]);
        ArchiveExtractor::new(temp.path()).extract(&archive).unwrap();
        assert_eq!(fs::read(temp.path().join("Glider/a.txt")).unwrap(), b"new");
    }

    #[test]
    fn empty_buffer_is_empty_archive() {
        let temp = tempdir().unwrap();
        let summary = ArchiveExtractor::new(temp.path().join("scratch"))
            .extract(&[])
            .unwrap();
        assert_eq!(summary, ExtractSummary::default());
    }

    #[test]
    fn garbage_is_an_extraction_failure() {
        let temp = tempdir().unwrap();
        let err = ArchiveExtractor::new(temp.path())
            .extract(b"definitely not a zip file")
            .unwrap_err();
        assert!(matches!(err, InstallError::ExtractionFailed { .. }));
    }

    #[test]
    fn traversal_entry_aborts_whole_extraction() {
        let temp = tempdir().unwrap();
        let scratch = temp.path().join("scratch");
        let archive = zip_of(&[("Glider/ok.txt", b"fine"), ("../../evil", b"boom")]);

        let err = ArchiveExtractor::new(&scratch).extract(&archive).unwrap_err();
        assert!(matches!(err, InstallError::UnsafeArchivePath { .. }));
        assert!(!temp.path().join("evil").exists());
        assert!(!temp.path().parent().unwrap().join("evil").exists());
    }
}
