//! Share-link lookup from pasted text.

use tracing::{debug, warn};

use crate::backend::{Catalog, StatusCode};
use crate::events::{Event, EventBus, Notice, SharedItem};
use crate::failure::ActionError;
use crate::guard::Action;
use crate::url_model::{parse_share_text, ResourceKind};

const RESULT_MS: u64 = 3000;

/// Looks up the first share link found in free text (with its password).
#[derive(Debug, Default)]
pub struct ShareLookup;

impl<D: Catalog + ?Sized> Action<D> for ShareLookup {
    type Input = String;
    const NAME: &'static str = "share lookup";

    fn run(&self, drive: &D, text: String, events: &EventBus) -> Result<(), ActionError> {
        let Some((url, password)) = parse_share_text(&text) else {
            debug!("no share link in text");
            return Err(ActionError::Invalid("No share link found".into()));
        };

        let kind = ResourceKind::classify(&url);
        if kind == ResourceKind::Unknown {
            events.notice(Notice::error(format!("{url} is not a valid share link"), 0));
            return Ok(());
        }
        events.emit(Event::ShareInfoCleared);

        let (code, item) = if kind == ResourceKind::Folder {
            events.notice(Notice::info(
                "Fetching folder info, this may take a few seconds...",
                30_000,
            ));
            let folder = drive.folder_info_by_url(&url, &password)?;
            (folder.info.code, SharedItem::Folder(folder))
        } else {
            events.notice(Notice::info("Fetching file info...", 20_000));
            let info = drive.share_info_by_url(&url, &password)?;
            (info.code, SharedItem::File(info))
        };

        if !code.is_success() {
            warn!(%url, code = code.code(), "share lookup declined");
        }
        events.notice(lookup_notice(code, &password));
        events.emit(Event::SharedInfo(item));
        Ok(())
    }

    fn busy_notice(&self) -> Notice {
        Notice::info("Still looking up the previous link, please retry shortly", 4000)
    }

    fn timeout_notice(&self) -> Notice {
        Notice::error("Network timeout, please retry later", 5000)
    }
}

fn lookup_notice(code: StatusCode, password: &str) -> Notice {
    match code {
        StatusCode::Success => Notice::success("Share info fetched", RESULT_MS),
        StatusCode::FileCancelled => {
            Notice::error("The file does not exist or was deleted", RESULT_MS)
        }
        StatusCode::UrlInvalid => Notice::error("Invalid link", RESULT_MS),
        StatusCode::PasswordError => {
            Notice::error(format!("Wrong password [{password}]"), RESULT_MS)
        }
        StatusCode::LackPassword => Notice::error(
            "Password required: put it after the link, separated by a space",
            RESULT_MS,
        ),
        StatusCode::NetworkError => Notice::error("Network error", RESULT_MS),
        other => Notice::error(format!("Lookup failed: {}", other.reason()), RESULT_MS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::fake::{drain, notices, FakeDrive, Reply};

    #[test]
    fn file_link_with_password() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        ShareLookup
            .run(&drive, "see https://share.test/iAbc123 pwd: x9z".into(), &bus)
            .unwrap();

        assert_eq!(drive.calls(), vec!["share_url https://share.test/iAbc123 x9z"]);
        let events = drain(&mut rx);
        assert!(matches!(events[0], Event::ShareInfoCleared));
        assert!(matches!(
            events.last(),
            Some(Event::SharedInfo(SharedItem::File(_)))
        ));
        assert_eq!(notices(&events).last().unwrap().text, "Share info fetched");
    }

    #[test]
    fn folder_link_uses_folder_lookup() {
        let drive = FakeDrive::replying(Reply::Code(StatusCode::PasswordError));
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        ShareLookup
            .run(&drive, "https://share.test/bXyz789 abc".into(), &bus)
            .unwrap();

        assert!(drive.calls()[0].starts_with("folder_url"));
        let events = drain(&mut rx);
        assert_eq!(notices(&events).last().unwrap().text, "Wrong password [abc]");
    }

    #[test]
    fn unknown_shape_never_calls_the_drive() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        ShareLookup
            .run(&drive, "https://share.test/a-b".into(), &bus)
            .unwrap();

        assert!(drive.calls().is_empty());
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(notices(&events)[0].text.contains("not a valid share link"));
    }

    #[test]
    fn text_without_link_is_invalid() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(4);
        let err = ShareLookup.run(&drive, "nothing here".into(), &bus).unwrap_err();
        assert!(matches!(err, ActionError::Invalid(_)));
    }
}
