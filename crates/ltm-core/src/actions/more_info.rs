//! Share details of one entry, or the direct link behind a share URL.

use crate::backend::{Catalog, EntryInfo, StatusCode};
use crate::events::{Event, EventBus, Notice};
use crate::failure::ActionError;
use crate::guard::Action;

#[derive(Debug, Clone)]
pub enum MoreInfoRequest {
    /// Share details of an owned entry. `as_link` answers with
    /// [`Event::ShareLink`] instead of [`Event::MoreInfo`].
    Entry { entry: EntryInfo, as_link: bool },
    /// Direct download link behind a share URL.
    DirectLink { url: String, password: String },
}

/// Details view: share info of one entry or a direct link.
#[derive(Debug, Default)]
pub struct MoreInfo;

impl<D: Catalog + ?Sized> Action<D> for MoreInfo {
    type Input = MoreInfoRequest;
    const NAME: &'static str = "info lookup";

    fn run(&self, drive: &D, req: MoreInfoRequest, events: &EventBus) -> Result<(), ActionError> {
        match req {
            MoreInfoRequest::Entry { mut entry, as_link } => {
                if let Some(id) = entry.id {
                    events.notice(Notice::info("Requesting, please wait...", 0));
                    let info = drive.share_info(id, entry.is_file)?;
                    entry.description = info.description;
                    entry.password = info.password;
                    entry.url = info.url;
                    // Clears the pending "requesting" line.
                    events.notice(Notice::info("", 0));
                }
                events.emit(if as_link {
                    Event::ShareLink(entry)
                } else {
                    Event::MoreInfo(entry)
                });
            }
            MoreInfoRequest::DirectLink { url, password } => {
                let link = drive.direct_link(&url, &password)?;
                let result = match (link.code, link.url) {
                    (StatusCode::Success, Some(direct)) => Ok(direct),
                    (StatusCode::Success, None) => Err(StatusCode::Failed),
                    (code, _) => Err(code),
                };
                events.emit(Event::DirectLink(result));
            }
        }
        Ok(())
    }
}
