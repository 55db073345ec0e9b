//! Drive collaborator contract.
//!
//! The drive client is split into traits along the seams the engine needs:
//! transfers for the download pool and upload queue, metadata for upload
//! post-steps, and account/catalog/recycle-bin calls for the single-action
//! workers. Every method is blocking (it performs network or disk I/O on the
//! calling thread); the engine only calls them from `spawn_blocking`.

mod error;
pub mod mirror;
mod status;
mod types;

use std::path::Path;

pub use error::{BackendError, BackendResult};
pub use mirror::MirrorDrive;
pub use status::StatusCode;
pub use types::{
    DirectLink, EntryInfo, FileEntry, FileId, FolderEntry, FolderListing, MoveTarget, PathCrumb,
    RecycledFile, RecycledFolder, ShareInfo, SharedFolder, Uploaded, ROOT_FOLDER,
};

/// Receives progress from a running transfer and tells it when to stop.
///
/// Implementations must be cheap: transfers call `on_progress` after every
/// chunk and poll `should_stop` at the same checkpoints.
pub trait TransferObserver: Send + Sync {
    /// One progress sample for the file currently being transferred.
    fn on_progress(&self, name: &str, total: u64, done: u64);

    /// One file inside a folder transfer failed; the transfer continues.
    fn on_item_failed(&self, _code: StatusCode, _item: &str) {}

    /// Checked between chunks; when true the transfer returns `BackendError::Stopped`.
    fn should_stop(&self) -> bool {
        false
    }
}

/// Observer that ignores progress and never stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TransferObserver for NoopObserver {
    fn on_progress(&self, _name: &str, _total: u64, _done: u64) {}
}

/// File and folder transfers.
pub trait Transfers: Send + Sync {
    /// Download one shared file into the directory `dest`.
    fn download_file(
        &self,
        url: &str,
        password: &str,
        dest: &Path,
        observer: &dyn TransferObserver,
    ) -> BackendResult<StatusCode>;

    /// Download a shared folder into a new sub-directory of `dest`. Individual
    /// file failures are reported through `observer.on_item_failed`.
    fn download_folder(
        &self,
        url: &str,
        password: &str,
        dest: &Path,
        observer: &dyn TransferObserver,
    ) -> BackendResult<StatusCode>;

    /// Upload one local file into `folder`.
    fn upload_file(
        &self,
        path: &Path,
        folder: FileId,
        observer: &dyn TransferObserver,
    ) -> BackendResult<Uploaded>;

    /// Upload a local directory tree into `folder`.
    fn upload_folder(
        &self,
        path: &Path,
        folder: FileId,
        observer: &dyn TransferObserver,
    ) -> BackendResult<StatusCode>;
}

/// Per-item share settings.
pub trait Metadata: Send + Sync {
    /// Set (or with an empty string, clear) the share password.
    fn set_password(&self, id: FileId, password: &str, is_file: bool)
        -> BackendResult<StatusCode>;

    fn set_description(
        &self,
        id: FileId,
        description: &str,
        is_file: bool,
    ) -> BackendResult<StatusCode>;
}

/// Session management.
pub trait Account: Send + Sync {
    fn login(&self, user: &str, password: &str) -> BackendResult<StatusCode>;

    fn login_by_cookie(&self, cookie: &str) -> BackendResult<StatusCode>;

    /// Session cookie of the current login, if any.
    fn cookie(&self) -> Option<String>;

    fn logout(&self) -> BackendResult<StatusCode>;
}

/// Browsing and mutating the drive tree.
pub trait Catalog: Metadata {
    fn list_files(&self, folder: FileId) -> BackendResult<Vec<FileEntry>>;

    fn list_folders(&self, folder: FileId) -> BackendResult<FolderListing>;

    /// Share info of an item owned by the logged-in account.
    fn share_info(&self, id: FileId, is_file: bool) -> BackendResult<ShareInfo>;

    /// Share info of a file known only by its share URL.
    fn share_info_by_url(&self, url: &str, password: &str) -> BackendResult<ShareInfo>;

    /// Share info of a folder known only by its share URL, with its files.
    fn folder_info_by_url(&self, url: &str, password: &str) -> BackendResult<SharedFolder>;

    fn direct_link(&self, url: &str, password: &str) -> BackendResult<DirectLink>;

    fn move_targets(&self) -> BackendResult<Vec<MoveTarget>>;

    fn move_file(&self, id: FileId, target: FileId) -> BackendResult<StatusCode>;

    fn move_folder(&self, id: FileId, target: FileId) -> BackendResult<StatusCode>;

    /// Move an item to the recycle bin.
    fn delete(&self, id: FileId, is_file: bool) -> BackendResult<StatusCode>;

    fn mkdir(&self, parent: FileId, name: &str, description: &str) -> BackendResult<StatusCode>;

    fn set_folder_info(
        &self,
        id: FileId,
        name: &str,
        description: &str,
    ) -> BackendResult<StatusCode>;
}

/// Recycle-bin listing and actions.
pub trait RecycleBin: Send + Sync {
    fn recycled_folders(&self) -> BackendResult<Vec<RecycledFolder>>;

    /// Files in a recycled folder, or the loose files when `folder` is `ROOT_FOLDER`.
    fn recycled_files(&self, folder: FileId) -> BackendResult<Vec<RecycledFile>>;

    fn recover(&self, files: &[FileId], folders: &[FileId]) -> BackendResult<StatusCode>;

    fn purge(&self, files: &[FileId], folders: &[FileId]) -> BackendResult<StatusCode>;

    fn clear(&self) -> BackendResult<StatusCode>;

    fn recover_all(&self) -> BackendResult<StatusCode>;
}
