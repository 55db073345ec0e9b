//! Recycle-bin listing.

use crate::backend::{FileId, RecycleBin, ROOT_FOLDER};
use crate::events::{Event, EventBus, Notice};
use crate::failure::ActionError;
use crate::guard::Action;

/// Lists the recycle bin, or one recycled folder when given its id.
#[derive(Debug, Default)]
pub struct RecycleList;

impl<D: RecycleBin + ?Sized> Action<D> for RecycleList {
    type Input = Option<FileId>;
    const NAME: &'static str = "recycle bin listing";

    fn run(&self, drive: &D, folder: Option<FileId>, events: &EventBus) -> Result<(), ActionError> {
        if let Some(id) = folder {
            let files = drive.recycled_files(id)?;
            events.emit(Event::RecycleFolder { id, files });
            return Ok(());
        }
        let folders = drive.recycled_folders()?;
        let files = drive.recycled_files(ROOT_FOLDER)?;
        events.emit(Event::RecycleListing { folders, files });
        events.notice(Notice::success("Recycle bin refreshed", 2000));
        Ok(())
    }
}
