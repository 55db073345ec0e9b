//! Moving drive items to the recycle bin.

use tracing::{debug, error, warn};

use super::ItemRef;
use crate::backend::{BackendError, Catalog};
use crate::events::{Event, EventBus, Notice};
use crate::failure::ActionError;
use crate::guard::{Action, BUSY_MS, RESULT_MS};

/// Moves items to the recycle bin. One failed item never aborts the batch.
#[derive(Debug, Default)]
pub struct Delete;

impl<D: Catalog + ?Sized> Action<D> for Delete {
    type Input = Vec<ItemRef>;
    const NAME: &'static str = "delete";

    fn run(&self, drive: &D, items: Vec<ItemRef>, events: &EventBus) -> Result<(), ActionError> {
        if items.is_empty() {
            return Ok(());
        }
        for item in &items {
            match drive.delete(item.id, item.is_file) {
                Ok(code) if code.is_success() => debug!(id = item.id, "deleted"),
                Ok(code) => {
                    warn!(id = item.id, code = code.code(), "delete declined");
                    events.notice(Notice::error(
                        format!("Deleting {} failed: {}", item.name, code.reason()),
                        RESULT_MS,
                    ));
                }
                Err(BackendError::Timeout) => {
                    warn!(id = item.id, "delete timed out");
                    events.notice(Notice::error(
                        format!("Deleting {} failed: network timeout", item.name),
                        3000,
                    ));
                }
                Err(e) => {
                    error!(id = item.id, error = %format!("{e:#}"), "delete failed");
                    events.notice(Notice::error(
                        format!("Deleting {} failed unexpectedly", item.name),
                        RESULT_MS,
                    ));
                }
            }
        }
        events.emit(Event::Deleted);
        Ok(())
    }

    fn busy_notice(&self) -> Notice {
        Notice::info("A delete is already running", BUSY_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::fake::{drain, notices, FakeDrive, Reply};
    use crate::backend::StatusCode;

    #[test]
    fn per_item_failures_do_not_abort() {
        let drive = FakeDrive::new();
        drive.script(1, Reply::Timeout);
        drive.script(2, Reply::Code(StatusCode::IdError));
        drive.script(4, Reply::Fault);
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let items = vec![
            ItemRef::file(1, "a"),
            ItemRef::folder(2, "b"),
            ItemRef::file(3, "c"),
            ItemRef::file(4, "d"),
        ];
        Delete.run(&drive, items, &bus).unwrap();

        assert_eq!(drive.calls(), vec!["delete 1", "delete 2", "delete 3", "delete 4"]);
        let events = drain(&mut rx);
        let texts: Vec<_> = notices(&events).into_iter().map(|n| n.text).collect();
        assert_eq!(
            texts,
            [
                "Deleting a failed: network timeout",
                "Deleting b failed: unknown file or folder id",
                "Deleting d failed unexpectedly"
            ]
        );
        assert!(matches!(events.last(), Some(Event::Deleted)));
    }

    #[test]
    fn empty_selection_is_a_no_op() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        Delete.run(&drive, Vec::new(), &bus).unwrap();
        assert!(drain(&mut rx).is_empty());
    }
}
