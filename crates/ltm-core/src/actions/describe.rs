//! Filling in share details for a batch of entries.

use std::path::PathBuf;
use tracing::debug;

use crate::backend::{Catalog, EntryInfo, StatusCode};
use crate::events::{Event, EventBus, Notice};
use crate::failure::ActionError;
use crate::guard::Action;
use crate::jobs::DownloadJob;

#[derive(Debug, Clone, Default)]
pub struct DescribeRequest {
    pub entries: Vec<EntryInfo>,
    /// When set, the filled-in entries are turned into download jobs
    /// writing into this directory.
    pub download_to: Option<PathBuf>,
}

/// Fills in share URL, password and description of owned drive entries.
#[derive(Debug, Default)]
pub struct Describe;

impl<D: Catalog + ?Sized> Action<D> for Describe {
    type Input = DescribeRequest;
    const NAME: &'static str = "share info fetch";

    fn run(&self, drive: &D, input: DescribeRequest, events: &EventBus) -> Result<(), ActionError> {
        if input.entries.is_empty() {
            return Ok(());
        }
        let mut filled = Vec::with_capacity(input.entries.len());
        for mut entry in input.entries {
            if let Some(id) = entry.id {
                let info = drive.share_info(id, entry.is_file)?;
                match info.code {
                    StatusCode::Success => {
                        entry.password = info.password;
                        entry.url = info.url;
                        entry.description = info.description;
                    }
                    StatusCode::NetworkError => {
                        events.notice(Notice::error("Network error, please retry later", 6000));
                        continue;
                    }
                    code => debug!(id, code = code.code(), "share info declined"),
                }
            }
            filled.push(entry);
        }

        match input.download_to {
            Some(dest) => {
                let jobs = filled
                    .into_iter()
                    .map(|e| DownloadJob::new(e.name, e.url, e.password, dest.clone()))
                    .collect();
                events.emit(Event::DownloadRequest(jobs));
            }
            None => events.emit(Event::Described(filled)),
        }
        Ok(())
    }
}
