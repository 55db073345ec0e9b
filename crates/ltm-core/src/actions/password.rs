//! Setting and clearing share passwords.

use tracing::warn;

use crate::backend::{FileId, Metadata, StatusCode};
use crate::events::{Event, EventBus, Notice};
use crate::failure::ActionError;
use crate::guard::{Action, RESULT_MS};

const FILE_MAX: usize = 6;
const FOLDER_MAX: usize = 12;
const MIN: usize = 2;

#[derive(Debug, Clone)]
pub struct PasswordEdit {
    pub id: FileId,
    pub is_file: bool,
    /// Empty disables the password.
    pub password: String,
}

/// Sets share passwords. The whole batch is validated before any change.
#[derive(Debug, Default)]
pub struct SetPassword;

fn validate(edit: &PasswordEdit) -> Result<(), ActionError> {
    let len = edit.password.chars().count();
    let max = if edit.is_file { FILE_MAX } else { FOLDER_MAX };
    if len == 0 || (MIN..=max).contains(&len) {
        return Ok(());
    }
    let kind = if edit.is_file { "File" } else { "Folder" };
    Err(ActionError::Invalid(format!(
        "{kind} passwords are {MIN}-{max} characters; leave empty to disable"
    )))
}

impl<D: Metadata + ?Sized> Action<D> for SetPassword {
    type Input = Vec<PasswordEdit>;
    const NAME: &'static str = "set password";

    fn run(&self, drive: &D, edits: Vec<PasswordEdit>, events: &EventBus) -> Result<(), ActionError> {
        edits.iter().try_for_each(validate)?;

        let mut last_failure: Option<StatusCode> = None;
        for edit in &edits {
            let code = drive.set_password(edit.id, &edit.password, edit.is_file)?;
            if !code.is_success() {
                warn!(id = edit.id, code = code.code(), "password change declined");
                last_failure = Some(code);
            }
        }
        match last_failure {
            Some(code) => events.notice(Notice::error(
                format!(
                    "Some password changes failed: {}; avoid special characters",
                    code.reason()
                ),
                RESULT_MS,
            )),
            None => events.notice(Notice::success("Passwords updated", 3000)),
        }
        events.emit(Event::RefreshRequested);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::fake::{drain, notices, FakeDrive};

    fn edit(id: FileId, is_file: bool, password: &str) -> PasswordEdit {
        PasswordEdit {
            id,
            is_file,
            password: password.into(),
        }
    }

    #[test]
    fn length_rules() {
        assert!(validate(&edit(1, true, "")).is_ok());
        assert!(validate(&edit(1, true, "ab")).is_ok());
        assert!(validate(&edit(1, true, "abcdef")).is_ok());
        assert!(validate(&edit(1, true, "a")).is_err());
        assert!(validate(&edit(1, true, "abcdefg")).is_err());
        assert!(validate(&edit(1, false, "abcdefghijkl")).is_ok());
        assert!(validate(&edit(1, false, "abcdefghijklm")).is_err());
    }

    #[test]
    fn one_invalid_edit_rejects_the_batch() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(8);
        let edits = vec![edit(1, true, "ok12"), edit(2, true, "x")];
        let err = SetPassword.run(&drive, edits, &bus).unwrap_err();

        assert!(drive.calls().is_empty());
        match err {
            ActionError::Invalid(why) => assert!(why.starts_with("File passwords are 2-6")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn applies_and_requests_refresh() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        SetPassword
            .run(&drive, vec![edit(1, true, "ok12"), edit(2, false, "")], &bus)
            .unwrap();

        assert_eq!(drive.calls(), vec!["password 1 ok12", "password 2 "]);
        let events = drain(&mut rx);
        assert_eq!(notices(&events)[0].text, "Passwords updated");
        assert!(matches!(events.last(), Some(Event::RefreshRequested)));
    }
}
