//! Signing in by session cookie or by user name and password.

use tracing::{debug, info, warn};

use crate::backend::Account;
use crate::events::{Event, EventBus, Notice};
use crate::failure::ActionError;
use crate::guard::Action;

/// Login input. A non-empty cookie is tried before the password.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub cookie: Option<String>,
}

/// Signs in to the drive account.
#[derive(Debug, Default)]
pub struct Login;

impl Login {
    fn attempt<D>(&self, drive: &D, input: &Credentials, events: &EventBus) -> Result<(), ActionError>
    where
        D: Account + ?Sized,
    {
        let user = (!input.user.is_empty()).then(|| input.user.clone());

        if let Some(cookie) = input.cookie.as_deref().filter(|c| !c.is_empty()) {
            let code = drive.login_by_cookie(cookie)?;
            if code.is_success() {
                info!(user = ?user, "logged in by cookie");
                events.notice(Notice::success("Logged in with saved cookie", 5000));
                events.emit(Event::LoginResult {
                    success: true,
                    user,
                    cookie: Some(cookie.to_string()),
                });
                return Ok(());
            }
            debug!(code = code.code(), "cookie login declined");
        }

        if input.user.is_empty() || input.password.is_empty() {
            events.notice(Notice::error("Login failed: missing username or password", 3000));
            events.emit(Event::LoginResult {
                success: false,
                user,
                cookie: None,
            });
            return Ok(());
        }

        let code = drive.login(&input.user, &input.password)?;
        if code.is_success() {
            info!(user = %input.user, "logged in");
            events.notice(Notice::success("Logged in", 5000));
            events.emit(Event::LoginResult {
                success: true,
                user,
                cookie: drive.cookie(),
            });
        } else {
            warn!(user = %input.user, code = code.code(), "login declined");
            events.notice(Notice::error(
                "Login failed, check username or password",
                8000,
            ));
            events.emit(Event::LoginResult {
                success: false,
                user,
                cookie: None,
            });
        }
        Ok(())
    }
}

impl<D: Account + ?Sized> Action<D> for Login {
    type Input = Credentials;
    const NAME: &'static str = "login";

    fn run(&self, drive: &D, input: Credentials, events: &EventBus) -> Result<(), ActionError> {
        let result = self.attempt(drive, &input, events);
        if result.is_err() {
            events.emit(Event::LoginResult {
                success: false,
                user: (!input.user.is_empty()).then_some(input.user),
                cookie: None,
            });
        }
        result
    }

    fn timeout_notice(&self) -> Notice {
        Notice::error("Login failed: network timeout", 3000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::fake::{drain, notices, FakeDrive, Reply};
    use crate::backend::StatusCode;

    fn creds(user: &str, password: &str, cookie: Option<&str>) -> Credentials {
        Credentials {
            user: user.into(),
            password: password.into(),
            cookie: cookie.map(str::to_string),
        }
    }

    fn login_result(events: &[Event]) -> (bool, Option<String>) {
        events
            .iter()
            .find_map(|e| match e {
                Event::LoginResult {
                    success, cookie, ..
                } => Some((*success, cookie.clone())),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn cookie_login_skips_password() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        Login.run(&drive, creds("", "", Some("c=1")), &bus).unwrap();

        assert_eq!(drive.calls(), vec!["cookie c=1"]);
        let events = drain(&mut rx);
        assert_eq!(login_result(&events), (true, Some("c=1".into())));
    }

    #[test]
    fn password_login_reports_session_cookie() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        Login.run(&drive, creds("ann", "secret", None), &bus).unwrap();

        let events = drain(&mut rx);
        assert_eq!(login_result(&events), (true, Some("session=1".into())));
        assert_eq!(notices(&events)[0].duration.as_millis(), 5000);
    }

    #[test]
    fn missing_credentials_never_reach_the_drive() {
        let drive = FakeDrive::new();
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        Login.run(&drive, creds("ann", "", None), &bus).unwrap();

        assert!(drive.calls().is_empty());
        let events = drain(&mut rx);
        assert_eq!(login_result(&events), (false, None));
        assert!(notices(&events)[0].text.contains("missing username"));
    }

    #[test]
    fn declined_login_suggests_checking_credentials() {
        let drive = FakeDrive::replying(Reply::Code(StatusCode::Failed));
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        Login.run(&drive, creds("ann", "nope", None), &bus).unwrap();

        let events = drain(&mut rx);
        assert_eq!(login_result(&events), (false, None));
        let notice = &notices(&events)[0];
        assert!(notice.text.contains("check username or password"));
        assert_eq!(notice.duration.as_millis(), 8000);
    }

    #[test]
    fn timeout_still_reports_a_failed_login() {
        let drive = FakeDrive::replying(Reply::Timeout);
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let err = Login.run(&drive, creds("ann", "pw", None), &bus).unwrap_err();

        assert!(matches!(err, ActionError::Timeout));
        assert_eq!(login_result(&drain(&mut rx)), (false, None));
    }
}
