//! Move targets and moving files or folders between folders.

use std::time::Duration;
use tracing::{error, info, warn};

use super::{settle, ItemRef};
use crate::backend::{BackendError, Catalog, FileId};
use crate::events::{Event, EventBus, Notice};
use crate::failure::ActionError;
use crate::guard::Action;

#[derive(Debug, Clone)]
pub enum MoveRequest {
    /// List the folders items can be moved into.
    Targets,
    Items { items: Vec<ItemRef>, target: FileId },
}

/// Moves files and folders between folders.
#[derive(Debug, Default)]
pub struct Move {
    settle: Duration,
}

impl Move {
    /// `settle` is waited after a move before announcing it.
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

impl<D: Catalog + ?Sized> Action<D> for Move {
    type Input = MoveRequest;
    const NAME: &'static str = "move";

    fn run(&self, drive: &D, req: MoveRequest, events: &EventBus) -> Result<(), ActionError> {
        let (items, target) = match req {
            MoveRequest::Targets => {
                events.notice(Notice::info("Requesting, please wait...", 0));
                let targets = drive.move_targets()?;
                events.emit(Event::MoveTargets(targets));
                events.notice(Notice::info("", 0));
                return Ok(());
            }
            MoveRequest::Items { items, target } => (items, target),
        };

        let mut files = Vec::new();
        let mut folders = Vec::new();
        for item in items {
            let result = if item.is_file {
                drive.move_file(item.id, target)
            } else {
                drive.move_folder(item.id, target)
            };
            match result {
                Ok(code) if code.is_success() => {
                    info!(id = item.id, target, "moved");
                    events.notice(Notice::success(format!("{} moved", item.name), 3000));
                    if item.is_file {
                        files.push(item.id);
                    } else {
                        folders.push(item.id);
                    }
                }
                Ok(code) => {
                    warn!(id = item.id, code = code.code(), "move declined");
                    let text = if item.is_file {
                        format!("Moving file {} failed", item.name)
                    } else {
                        format!(
                            "Moving folder {} failed; folders with sub-folders cannot be moved",
                            item.name
                        )
                    };
                    events.notice(Notice::error(text, 4000));
                }
                Err(BackendError::Timeout) => {
                    warn!(id = item.id, "move timed out");
                    events.notice(Notice::error(
                        format!("Moving {} failed: network timeout, please retry later", item.name),
                        5000,
                    ));
                }
                Err(e) => {
                    error!(id = item.id, error = %e, "move failed");
                    events.notice(Notice::error(
                        format!("Moving {} failed: unexpected error", item.name),
                        5000,
                    ));
                }
            }
        }

        if !files.is_empty() || !folders.is_empty() {
            settle(self.settle);
            events.emit(Event::Moved { files, folders });
        }
        Ok(())
    }
}
