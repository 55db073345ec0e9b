//! Typed events for display layers.
//!
//! Everything the engine reports (notices, progress, queue snapshots and the
//! structured results of single actions) goes through one broadcast channel.
//! A slow subscriber may lag and miss events; the next snapshot supersedes
//! whatever it missed.

use std::time::Duration;
use tokio::sync::broadcast;

use crate::backend::{
    EntryInfo, FileEntry, FileId, FolderEntry, MoveTarget, PathCrumb, RecycledFile,
    RecycledFolder, ShareInfo, SharedFolder, StatusCode,
};
use crate::jobs::{DownloadJob, JobKey, Snapshot, UploadJob};
use crate::update::UpdateCheck;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A one-shot status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    /// Suggested display time; zero means until replaced.
    pub duration: Duration,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>, millis: u64) -> Self {
        Self {
            text: text.into(),
            level,
            duration: Duration::from_millis(millis),
        }
    }

    pub fn info(text: impl Into<String>, millis: u64) -> Self {
        Self::new(NoticeLevel::Info, text, millis)
    }

    pub fn success(text: impl Into<String>, millis: u64) -> Self {
        Self::new(NoticeLevel::Success, text, millis)
    }

    pub fn warning(text: impl Into<String>, millis: u64) -> Self {
        Self::new(NoticeLevel::Warning, text, millis)
    }

    pub fn error(text: impl Into<String>, millis: u64) -> Self {
        Self::new(NoticeLevel::Error, text, millis)
    }
}

/// A shared share-link lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedItem {
    File(ShareInfo),
    Folder(SharedFolder),
}

/// Refreshed parts of a folder view; `None` parts were not requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub folder: FileId,
    pub files: Option<Vec<FileEntry>>,
    pub folders: Option<Vec<FolderEntry>>,
    pub path: Option<Vec<PathCrumb>>,
}

#[derive(Debug, Clone)]
pub enum Event {
    Notice(Notice),
    /// Progress of one transfer job.
    Progress {
        key: JobKey,
        line: String,
        rate: u16,
    },
    Downloads(Snapshot<DownloadJob>),
    Uploads(Snapshot<UploadJob>),
    /// One file inside a folder transfer failed; the job itself continues.
    ItemFailed {
        key: JobKey,
        code: StatusCode,
        item: String,
    },
    /// Aggregate status line of the download pool.
    Status(String),
    LoginResult {
        success: bool,
        user: Option<String>,
        cookie: Option<String>,
    },
    LoggedOut,
    ShareInfoCleared,
    SharedInfo(SharedItem),
    /// Jobs ready to hand to the download dispatcher.
    DownloadRequest(Vec<DownloadJob>),
    Described(Vec<EntryInfo>),
    Listing(Listing),
    Deleted,
    MoreInfo(EntryInfo),
    ShareLink(EntryInfo),
    DirectLink(Result<String, StatusCode>),
    MoveTargets(Vec<MoveTarget>),
    Moved {
        files: Vec<FileId>,
        folders: Vec<FileId>,
    },
    /// The current folder view is stale.
    RefreshRequested,
    RecycleListing {
        folders: Vec<RecycledFolder>,
        files: Vec<RecycledFile>,
    },
    RecycleFolder {
        id: FileId,
        files: Vec<RecycledFile>,
    },
    RecycleChanged,
    UpdateCheck(UpdateCheck),
}

/// Broadcast fan-out of engine events. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Sends to every current subscriber; with none, the event is dropped.
    pub fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    pub fn notice(&self, notice: Notice) {
        self.emit(Event::Notice(notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_events_in_order() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.notice(Notice::info("one", 1000));
        bus.emit(Event::Deleted);

        for rx in [&mut a, &mut b] {
            match rx.recv().await.unwrap() {
                Event::Notice(n) => assert_eq!(n.text, "one"),
                other => panic!("unexpected {other:?}"),
            }
            assert!(matches!(rx.recv().await.unwrap(), Event::Deleted));
        }
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        let bus = EventBus::new(0);
        bus.emit(Event::RefreshRequested);
        let notice = Notice::error("boom", 0);
        assert_eq!(notice.duration, Duration::ZERO);
        assert_eq!(notice.level, NoticeLevel::Error);
    }
}
