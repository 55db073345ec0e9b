//! Transfer scheduling.
//!
//! `DownloadDispatcher` runs download jobs on a bounded pool of workers whose
//! ceiling can change at runtime; `UploadQueue` runs uploads one at a time.
//! Both publish their job snapshots through the event bus after every change.

mod dispatcher;
mod state;
mod upload;
mod worker;

pub use dispatcher::DownloadDispatcher;
pub use upload::UploadQueue;
