//! Checking the release feed for a newer version.

use tracing::{debug, info};

use crate::events::{Event, EventBus};
use crate::failure::ActionError;
use crate::guard::Action;
use crate::update::{is_newer, parse_version, Release, ReleaseFeed, UpdateCheck};

/// Asks the release endpoints, in order, for the latest version.
///
/// The input is the `manual` flag: background checks only report an
/// available update and stay silent otherwise.
#[derive(Debug, Clone)]
pub struct CheckUpdate {
    current: String,
    endpoints: Vec<String>,
}

impl CheckUpdate {
    pub fn new(current: impl Into<String>, endpoints: Vec<String>) -> Self {
        Self {
            current: current.into(),
            endpoints,
        }
    }

    fn latest<F: ReleaseFeed + ?Sized>(&self, feed: &F) -> Result<Release, String> {
        let mut last = String::from("no release endpoints configured");
        for endpoint in &self.endpoints {
            match feed.latest_release(endpoint) {
                Ok(release) => return Ok(release),
                Err(e) => {
                    debug!(%endpoint, error = %e, "release endpoint failed");
                    last = format!("{endpoint}: {e}");
                }
            }
        }
        Err(last)
    }
}

impl<F: ReleaseFeed + ?Sized> Action<F> for CheckUpdate {
    type Input = bool;
    const NAME: &'static str = "update check";

    fn run(&self, feed: &F, manual: bool, events: &EventBus) -> Result<(), ActionError> {
        let check = match self.latest(feed) {
            Ok(release) if is_newer(&self.current, &release.tag_name) => {
                info!(tag = %release.tag_name, "update available");
                UpdateCheck::Available {
                    tag: release.tag_name,
                    notes: release.body,
                }
            }
            Ok(release) if parse_version(&release.tag_name).is_none() => {
                UpdateCheck::Failed(format!("unrecognized release tag {}", release.tag_name))
            }
            Ok(_) => UpdateCheck::UpToDate,
            Err(why) => UpdateCheck::Failed(why),
        };
        if manual || matches!(check, UpdateCheck::Available { .. }) {
            events.emit(Event::UpdateCheck(check));
        }
        Ok(())
    }
}
