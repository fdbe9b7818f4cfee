//! One download-verify-extract-commit attempt

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use hangar_errors::{Error, InstallError};
use hangar_events::{AppEvent, DownloadEvent, InstallEvent};
use hangar_hash::ChecksumStream;
use hangar_net::ResponseHandler;
use hangar_types::{InstallStatus, Revision};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::archive::{ArchiveExtractor, ExtractSummary};
use crate::install::{Install, WeakInstall};
use crate::scratch::ScratchDir;

/// Upper bound on the buffer reserved from a server-supplied Content-Length
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

type Outcome = Result<ExtractSummary, (InstallStatus, InstallError)>;

#[derive(Default)]
struct SessionState {
    buffer: Vec<u8>,
    checksum: ChecksumStream,
    bytes_received: u64,
    expected_length: Option<u64>,
    scratch_error: Option<InstallError>,
    finished: bool,
}

/// Receives one package archive and installs it.
///
/// The body is hashed as it arrives and buffered in memory. Once the
/// transport completes, the checksum is verified, the archive is unpacked
/// into a scratch directory beside the target, and the package directory is
/// moved into place. Every failure removes the scratch directory and leaves
/// the previous install untouched.
pub struct InstallSession {
    id: Uuid,
    owner: WeakInstall,
    package: String,
    url: String,
    expected_checksum: String,
    revision: Revision,
    dir_name: String,
    target: PathBuf,
    scratch: ScratchDir,
    state: RefCell<SessionState>,
}

impl InstallSession {
    /// Capture everything the attempt needs from the install's package
    pub(crate) fn new(owner: &Install) -> Result<Rc<Self>, Error> {
        let package = owner.package();
        let qualified = package.qualified_id();
        let Some(url) = package.download_urls().into_iter().next() else {
            return Err(InstallError::MissingDownloadUrl { package: qualified }.into());
        };
        let dir_name = package.dir_name()?;
        let expected_checksum = package.checksum();
        let scratch = ScratchDir::for_target(owner.path(), &expected_checksum);

        Ok(Rc::new(Self {
            id: Uuid::new_v4(),
            owner: owner.downgrade(),
            package: qualified,
            url,
            expected_checksum,
            revision: package.revision(),
            dir_name,
            target: owner.path().to_path_buf(),
            scratch,
            state: RefCell::new(SessionState::default()),
        }))
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Catalog revision this attempt installs
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    #[must_use]
    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.state.borrow().bytes_received
    }

    #[must_use]
    pub fn expected_length(&self) -> Option<u64> {
        self.state.borrow().expected_length
    }

    /// Whole percent received; `0` while the length is unknown
    #[must_use]
    pub fn percent_downloaded(&self) -> u32 {
        let state = self.state.borrow();
        match state.expected_length {
            Some(total) if total > 0 => {
                let percent = state.bytes_received.saturating_mul(100) / total;
                u32::try_from(percent.min(100)).unwrap_or(100)
            }
            _ => 0,
        }
    }

    fn emit(&self, event: AppEvent) {
        if let Some(owner) = self.owner.upgrade() {
            owner.emit(event);
        }
    }

    /// Mark the attempt finished; `false` if it already was
    fn begin_finish(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.finished {
            return false;
        }
        state.finished = true;
        true
    }

    fn run_pipeline(&self, status: u16) -> Outcome {
        let (buffer, checksum, scratch_error) = {
            let mut state = self.state.borrow_mut();
            (
                std::mem::take(&mut state.buffer),
                std::mem::take(&mut state.checksum),
                state.scratch_error.take(),
            )
        };

        self.emit(AppEvent::Download(DownloadEvent::Completed {
            url: self.url.clone(),
            package: self.package.clone(),
            final_size: buffer.len() as u64,
            status_code: status,
        }));

        if status != 200 {
            error!(url = %self.url, status, "download failure");
            let failure = match InstallStatus::from_response_code(status) {
                InstallStatus::FailNotFound => InstallError::NotFound {
                    url: self.url.clone(),
                },
                _ => InstallError::DownloadFailed {
                    url: self.url.clone(),
                    status,
                },
            };
            return Err((InstallStatus::from_response_code(status), failure));
        }

        let actual = checksum.finalize();
        if !actual.matches_hex(&self.expected_checksum) {
            error!(
                url = %self.url,
                expected = %self.expected_checksum,
                actual = %actual,
                "md5 verification failed"
            );
            return Err((
                InstallStatus::FailChecksum,
                InstallError::ChecksumMismatch {
                    package: self.package.clone(),
                    expected: self.expected_checksum.clone(),
                    actual: actual.to_hex(),
                },
            ));
        }

        if let Some(err) = scratch_error {
            return Err((InstallStatus::FailFilesystem, err));
        }

        self.emit(AppEvent::Install(InstallEvent::Extracting {
            package: self.package.clone(),
            scratch_path: self.scratch.path().to_path_buf(),
        }));
        let summary = ArchiveExtractor::new(self.scratch.path())
            .extract(&buffer)
            .map_err(|e| {
                warn!(package = %self.package, error = %e, "zip extraction failed");
                (InstallStatus::FailExtract, e)
            })?;
        drop(buffer);

        self.commit(&summary)
            .map_err(|e| (InstallStatus::FailFilesystem, e))?;
        self.scratch.remove();
        Ok(summary)
    }

    /// Move `<scratch>/<dir_name>` over the target
    fn commit(&self, summary: &ExtractSummary) -> Result<(), InstallError> {
        let source = self.scratch.path().join(&self.dir_name);
        let source_exists = source.is_dir();
        if !source_exists && summary.files > 0 {
            error!(
                package = %self.package,
                dir = %self.dir_name,
                "archive does not contain the package directory"
            );
            return Err(InstallError::FilesystemError {
                operation: "locate extracted package directory".to_string(),
                path: source.display().to_string(),
                message: format!("archive has no top-level directory {}", self.dir_name),
            });
        }

        if let Ok(meta) = fs::symlink_metadata(&self.target) {
            let removed = if meta.is_dir() {
                fs::remove_dir_all(&self.target)
            } else {
                fs::remove_file(&self.target)
            };
            removed.map_err(|e| {
                InstallError::filesystem("remove previous install", &self.target, &e)
            })?;
        }

        if source_exists {
            fs::rename(&source, &self.target).map_err(|e| {
                InstallError::filesystem("move extracted package into place", &self.target, &e)
            })?;
        } else {
            fs::create_dir_all(&self.target).map_err(|e| {
                InstallError::filesystem("create install directory", &self.target, &e)
            })?;
        }
        debug!(package = %self.package, target = %self.target.display(), "committed install");
        Ok(())
    }

    fn finish(&self, outcome: Outcome) {
        let owner = self.owner.upgrade();
        match outcome {
            Ok(summary) => {
                if let Some(owner) = owner {
                    owner.session_succeeded(self.id, self.revision, summary.entries());
                }
            }
            Err((status, failure)) => {
                self.scratch.remove();
                if let Some(owner) = owner {
                    owner.session_failed(self.id, status, &failure);
                }
            }
        }
    }
}

impl ResponseHandler for InstallSession {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn on_headers(&self, content_length: Option<u64>) {
        let scratch_error = self.scratch.create().err().map(|e| {
            warn!(
                path = %self.scratch.path().display(),
                error = %e,
                "failed to create scratch directory"
            );
            InstallError::filesystem("create scratch directory", self.scratch.path(), &e)
        });

        {
            let mut state = self.state.borrow_mut();
            state.checksum = ChecksumStream::new();
            state.buffer.clear();
            state.bytes_received = 0;
            state.expected_length = content_length;
            state.scratch_error = scratch_error;
            if let Some(len) = content_length {
                let hint = usize::try_from(len.min(MAX_PREALLOCATION)).unwrap_or_default();
                if state.buffer.try_reserve(hint).is_err() {
                    debug!(content_length = len, "could not preallocate download buffer");
                }
            }
        }

        self.emit(AppEvent::Download(DownloadEvent::Started {
            url: self.url.clone(),
            package: self.package.clone(),
            total_size: content_length,
        }));
    }

    fn on_body_chunk(&self, chunk: &[u8]) {
        let (bytes, total) = {
            let mut state = self.state.borrow_mut();
            if state.finished {
                return;
            }
            state.checksum.update(chunk);
            state.buffer.extend_from_slice(chunk);
            state.bytes_received += chunk.len() as u64;
            (state.bytes_received, state.expected_length)
        };

        if let Some(owner) = self.owner.upgrade() {
            owner.notify_progress(bytes, total);
        }
    }

    fn on_complete(&self, status: u16) {
        if !self.begin_finish() {
            return;
        }
        let outcome = self.run_pipeline(status);
        self.finish(outcome);
    }

    fn on_failure(&self, cancelled: bool) {
        if !self.begin_finish() {
            return;
        }

        let bytes_downloaded = {
            let mut state = self.state.borrow_mut();
            state.buffer = Vec::new();
            state.bytes_received
        };
        self.emit(AppEvent::Download(DownloadEvent::Failed {
            url: self.url.clone(),
            package: self.package.clone(),
            bytes_downloaded,
            cancelled,
        }));

        let outcome = if cancelled {
            (InstallStatus::UserCancelled, InstallError::Cancelled)
        } else {
            warn!(url = %self.url, bytes_downloaded, "transfer aborted");
            (
                InstallStatus::FailDownload,
                InstallError::TransferAborted {
                    url: self.url.clone(),
                },
            )
        };
        self.finish(Err(outcome));
    }
}
