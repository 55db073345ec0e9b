//! Ending the drive session.

use tracing::info;

use crate::backend::{Account, StatusCode};
use crate::events::{Event, EventBus, Notice};
use crate::failure::{check, ActionError};
use crate::guard::Action;

/// Ends the drive session. The input says whether to announce
/// [`Event::LoggedOut`] so views can reset.
#[derive(Debug, Default)]
pub struct Logout;

impl<D: Account + ?Sized> Action<D> for Logout {
    type Input = bool;
    const NAME: &'static str = "logout";

    fn run(&self, drive: &D, announce: bool, events: &EventBus) -> Result<(), ActionError> {
        check(drive.logout()?)?;
        info!("logged out");
        if announce {
            events.emit(Event::LoggedOut);
        }
        events.notice(Notice::success("Logged out", 4000));
        Ok(())
    }

    fn declined_notice(&self, _code: StatusCode) -> Notice {
        Notice::error("Logout failed, please retry", 5000)
    }
}
