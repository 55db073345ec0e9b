//! Recovering and purging recycle-bin items.

use std::time::Duration;
use tracing::info;

use super::settle;
use crate::backend::{FileId, RecycleBin, StatusCode};
use crate::events::{Event, EventBus, Notice};
use crate::failure::ActionError;
use crate::guard::Action;

const RESULT_MS: u64 = 4500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecycleRequest {
    Recover {
        files: Vec<FileId>,
        folders: Vec<FileId>,
    },
    Purge {
        files: Vec<FileId>,
        folders: Vec<FileId>,
    },
    Clear,
    RecoverAll,
}

/// Recovers or permanently deletes recycle-bin items.
#[derive(Debug, Default)]
pub struct RecycleAct {
    settle: Duration,
}

impl RecycleAct {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

impl<D: RecycleBin + ?Sized> Action<D> for RecycleAct {
    type Input = RecycleRequest;
    const NAME: &'static str = "recycle bin";

    fn run(&self, drive: &D, req: RecycleRequest, events: &EventBus) -> Result<(), ActionError> {
        let (code, done) = match &req {
            RecycleRequest::Recover { files, folders }
            | RecycleRequest::Purge { files, folders }
                if files.is_empty() && folders.is_empty() =>
            {
                return Ok(());
            }
            RecycleRequest::Recover { files, folders } => (
                drive.recover(files, folders)?,
                "Selected items recovered, refreshing",
            ),
            RecycleRequest::Purge { files, folders } => (
                drive.purge(files, folders)?,
                "Selected items deleted permanently, refreshing",
            ),
            RecycleRequest::Clear => (drive.clear()?, "Recycle bin emptied, refreshing"),
            RecycleRequest::RecoverAll => {
                (drive.recover_all()?, "Everything recovered, refreshing")
            }
        };

        match code {
            StatusCode::Success => {
                info!(request = ?req, "recycle bin updated");
                events.notice(Notice::success(done, 2500));
                settle(self.settle);
                events.emit(Event::RecycleChanged);
                Ok(())
            }
            StatusCode::NetworkError => {
                events.notice(Notice::error("Network error, please retry later", RESULT_MS));
                Ok(())
            }
            code => Err(ActionError::Declined(code)),
        }
    }

    fn declined_notice(&self, _code: StatusCode) -> Notice {
        Notice::error("Recycle bin operation failed, please retry", RESULT_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::fake::{drain, notices, FakeDrive, Reply};

    #[test]
    fn empty_selection_is_a_no_op() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let req = RecycleRequest::Purge {
            files: vec![],
            folders: vec![],
        };
        RecycleAct::default().run(&drive, req, &bus).unwrap();
        assert!(drive.calls().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn success_announces_change() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let req = RecycleRequest::Recover {
            files: vec![60],
            folders: vec![],
        };
        RecycleAct::default().run(&drive, req, &bus).unwrap();

        assert_eq!(drive.calls(), vec!["recover [60] []"]);
        let events = drain(&mut rx);
        assert_eq!(notices(&events)[0].duration.as_millis(), 2500);
        assert!(matches!(events.last(), Some(Event::RecycleChanged)));
    }

    #[test]
    fn network_error_gets_its_own_notice() {
        let drive = FakeDrive::replying(Reply::Code(StatusCode::NetworkError));
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        RecycleAct::default()
            .run(&drive, RecycleRequest::Clear, &bus)
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(notices(&events)[0].text.starts_with("Network error"));
    }

    #[test]
    fn other_codes_are_declined() {
        let drive = FakeDrive::replying(Reply::Code(StatusCode::Failed));
        let bus = EventBus::new(8);
        assert!(matches!(
            RecycleAct::default().run(&drive, RecycleRequest::RecoverAll, &bus),
            Err(ActionError::Declined(StatusCode::Failed))
        ));
    }
}
