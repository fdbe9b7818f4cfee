#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package installation for hangar
//!
//! An [`Install`] is the on-disk presence of one catalog package. Updating
//! it runs an install session: the archive is downloaded through a
//! [`hangar_net::Transport`], its MD5 checksum is verified, it is unpacked
//! into a scratch directory beside the target and the package directory is
//! then moved into place. The `.revision` sidecar records which catalog
//! revision is on disk.
//!
//! [`Root`] is the registry that owns catalogs and installs and bounds how
//! many sessions run at once. Everything is single-threaded: handles are
//! reference counted, and outcome callbacks run on the thread that drives
//! the transport.

mod archive;
mod install;
mod package_ext;
mod registry;
mod revision;
mod root;
mod scratch;
mod session;

pub use archive::{validate_entry_name, ArchiveExtractor, ExtractSummary};
pub use install::{Install, InstallCallback, ProgressCallback};
pub use package_ext::PackageInstallExt;
pub use registry::Registry;
pub use revision::{read_revision, revision_path, write_revision, REVISION_FILE};
pub use root::{PackageInstallCallback, Root};
pub use scratch::ScratchDir;
pub use session::InstallSession;
