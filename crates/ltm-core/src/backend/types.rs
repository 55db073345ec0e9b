//! Info objects returned by drive listings and lookups.

use serde::{Deserialize, Serialize};

use super::StatusCode;

/// Drive-side identifier of a file or folder.
pub type FileId = i64;

/// Id of the drive's root folder.
pub const ROOT_FOLDER: FileId = -1;

/// A file in a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: FileId,
    pub name: String,
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    pub modified: u64,
    pub downloads: u32,
    pub has_password: bool,
    pub has_description: bool,
}

/// A sub-folder in a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub id: FileId,
    pub name: String,
    pub description: String,
    pub has_password: bool,
}

/// One element of a breadcrumb path, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCrumb {
    pub name: String,
    pub id: FileId,
}

/// Sub-folders of a folder plus the path leading to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderListing {
    pub folders: Vec<FolderEntry>,
    pub path: Vec<PathCrumb>,
}

/// Share metadata for one file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareInfo {
    pub code: StatusCode,
    pub name: String,
    pub url: String,
    pub password: String,
    pub description: String,
    pub size: u64,
    pub is_file: bool,
}

impl ShareInfo {
    /// Info carrying only a status code, for declined lookups.
    pub fn declined(code: StatusCode) -> Self {
        Self {
            code,
            name: String::new(),
            url: String::new(),
            password: String::new(),
            description: String::new(),
            size: 0,
            is_file: true,
        }
    }
}

/// A shared folder resolved by URL: its own info plus the files inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedFolder {
    pub info: ShareInfo,
    pub files: Vec<ShareInfo>,
}

/// Direct-download link lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectLink {
    pub code: StatusCode,
    pub url: Option<String>,
}

/// Result of uploading a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uploaded {
    pub status: StatusCode,
    pub id: FileId,
    pub is_file: bool,
}

/// A folder available as a move destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTarget {
    pub name: String,
    pub id: FileId,
}

/// A top-level folder in the recycle bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycledFolder {
    pub id: FileId,
    pub name: String,
    pub files: Vec<RecycledFile>,
}

/// A file in the recycle bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycledFile {
    pub id: FileId,
    pub name: String,
    pub size: u64,
}

/// Caller-side view of a drive item, filled in by share-info lookups.
///
/// `id` is `None` for items known only by share URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub id: Option<FileId>,
    pub name: String,
    pub is_file: bool,
    pub url: String,
    pub password: String,
    pub description: String,
}

impl EntryInfo {
    pub fn file(id: FileId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            is_file: true,
            ..Self::default()
        }
    }

    pub fn folder(id: FileId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            is_file: false,
            ..Self::default()
        }
    }
}
