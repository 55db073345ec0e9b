//! Folder listing refresh.

use crate::backend::{Catalog, FileId};
use crate::events::{Event, EventBus, Listing, Notice};
use crate::failure::ActionError;
use crate::guard::{Action, BUSY_MS};

/// Which parts of a folder view to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRequest {
    pub folder: FileId,
    pub files: bool,
    pub folders: bool,
    pub path: bool,
}

impl ListRequest {
    /// Everything about `folder`.
    pub fn all(folder: FileId) -> Self {
        Self {
            folder,
            files: true,
            folders: true,
            path: true,
        }
    }
}

/// Refreshes a folder view; lists come back sorted by name.
#[derive(Debug, Default)]
pub struct ListRefresh;

impl<D: Catalog + ?Sized> Action<D> for ListRefresh {
    type Input = ListRequest;
    const NAME: &'static str = "directory refresh";

    fn run(&self, drive: &D, req: ListRequest, events: &EventBus) -> Result<(), ActionError> {
        let mut listing = Listing {
            folder: req.folder,
            ..Listing::default()
        };
        if req.files {
            let mut files = drive.list_files(req.folder)?;
            files.sort_by(|a, b| a.name.cmp(&b.name));
            listing.files = Some(files);
        }
        if req.folders || req.path {
            let mut found = drive.list_folders(req.folder)?;
            if req.folders {
                found.folders.sort_by(|a, b| a.name.cmp(&b.name));
                listing.folders = Some(found.folders);
            }
            if req.path {
                listing.path = Some(found.path);
            }
        }
        events.emit(Event::Listing(listing));
        Ok(())
    }

    fn busy_notice(&self) -> Notice {
        Notice::info("Directory refresh in progress", BUSY_MS)
    }

    fn timeout_notice(&self) -> Notice {
        Notice::error("Network timeout, cannot refresh directory", 7000)
    }

    fn unexpected_notice(&self) -> Notice {
        Notice::error("Unexpected error, cannot refresh directory", 7000)
    }
}
