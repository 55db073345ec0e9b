//! Creating folders and saving name or description edits.

use std::time::Duration;
use tracing::{info, warn};

use super::settle;
use crate::backend::{Catalog, FileId};
use crate::events::{Event, EventBus, Notice};
use crate::failure::ActionError;
use crate::guard::{Action, RESULT_MS};

#[derive(Debug, Clone)]
pub struct NewFolder {
    pub parent: FileId,
    pub name: String,
    pub description: String,
    /// Names already present in `parent`, as the caller currently sees them.
    pub siblings: Vec<String>,
}

/// One description (file) or name plus description (folder) edit.
#[derive(Debug, Clone)]
pub struct EntryEdit {
    pub id: FileId,
    pub is_file: bool,
    /// Current name.
    pub name: String,
    /// Folders only; `None` keeps the current name.
    pub new_name: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub enum EditRequest {
    Mkdir(NewFolder),
    Edit(Vec<EntryEdit>),
}

/// Creates folders and edits names and descriptions.
#[derive(Debug, Default)]
pub struct RenameMkdir {
    settle: Duration,
}

impl RenameMkdir {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    fn mkdir<D: Catalog + ?Sized>(
        &self,
        drive: &D,
        folder: NewFolder,
        events: &EventBus,
    ) -> Result<(), ActionError> {
        let name = folder.name;
        if folder.siblings.iter().any(|s| *s == name) {
            events.notice(Notice::error(format!("Folder already exists: {name}"), 7000));
            return Ok(());
        }
        let code = drive.mkdir(folder.parent, &name, &folder.description)?;
        if !code.is_success() {
            warn!(parent = folder.parent, %name, code = code.code(), "mkdir declined");
            events.notice(Notice::error(format!("Failed to create folder: {name}"), 7000));
            return Ok(());
        }
        info!(parent = folder.parent, %name, "folder created");
        settle(self.settle);
        events.emit(Event::RefreshRequested);
        events.notice(Notice::success(format!("Created folder {name}"), RESULT_MS));
        Ok(())
    }
}

impl<D: Catalog + ?Sized> Action<D> for RenameMkdir {
    type Input = EditRequest;
    const NAME: &'static str = "edit";

    fn run(&self, drive: &D, req: EditRequest, events: &EventBus) -> Result<(), ActionError> {
        let edits = match req {
            EditRequest::Mkdir(folder) => return self.mkdir(drive, folder, events),
            EditRequest::Edit(edits) => edits,
        };

        let mut failed = false;
        for edit in edits {
            let code = if edit.is_file {
                drive.set_description(edit.id, &edit.description, true)?
            } else {
                let name = edit.new_name.as_deref().unwrap_or(&edit.name);
                drive.set_folder_info(edit.id, name, &edit.description)?
            };
            if !code.is_success() {
                warn!(id = edit.id, code = code.code(), "edit declined");
                failed = true;
            }
        }
        events.emit(Event::RefreshRequested);
        if failed {
            events.notice(Notice::error("Some changes failed", 6000));
        } else {
            events.notice(Notice::success("Changes saved", RESULT_MS));
        }
        Ok(())
    }
}
