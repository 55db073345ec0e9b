//! Single-flight guarded actions.
//!
//! Every non-transfer backend operation (login, rename, delete, ...) is an
//! [`Action`] run through a [`Guarded`] runner: a submission while the
//! previous run is still going is rejected with a busy notice, never queued.
//! The run itself happens on the blocking pool; its failure is classified
//! into a notice and the busy flag is released on every exit path.

mod flight;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

pub use flight::{BusyGuard, SingleFlight};

use crate::backend::StatusCode;
use crate::events::{EventBus, Notice};
use crate::failure::ActionError;

pub const BUSY_MS: u64 = 3100;
pub const TIMEOUT_MS: u64 = 6000;
pub const RESULT_MS: u64 = 4000;

/// One backend operation, parameterized by the drive interface it needs.
pub trait Action<D: ?Sized>: Send + Sync + 'static {
    type Input: Send + 'static;

    /// Used in log fields and default messages.
    const NAME: &'static str;

    /// Performs the operation. Runs on a blocking thread.
    fn run(&self, drive: &D, input: Self::Input, events: &EventBus) -> Result<(), ActionError>;

    fn busy_notice(&self) -> Notice {
        Notice::info("Another operation is running, please retry later", BUSY_MS)
    }

    fn timeout_notice(&self) -> Notice {
        Notice::error("Network timeout, please retry later", TIMEOUT_MS)
    }

    fn declined_notice(&self, code: StatusCode) -> Notice {
        Notice::error(format!("{} failed: {}", Self::NAME, code.reason()), RESULT_MS)
    }

    fn unexpected_notice(&self) -> Notice {
        Notice::error(format!("{} failed unexpectedly", Self::NAME), RESULT_MS)
    }
}

/// Outcome of [`Guarded::submit`].
#[derive(Debug)]
pub enum Submission {
    Accepted(JoinHandle<()>),
    /// Another run was in flight; a busy notice was emitted.
    Rejected,
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted(_))
    }

    /// Waits for an accepted run to finish. Returns whether it was accepted.
    pub async fn finished(self) -> bool {
        match self {
            Submission::Accepted(handle) => {
                if let Err(e) = handle.await {
                    error!(error = %e, "guarded action task failed");
                }
                true
            }
            Submission::Rejected => false,
        }
    }
}

/// Runs one [`Action`] with at most one invocation in flight.
pub struct Guarded<A, D: ?Sized> {
    action: Arc<A>,
    drive: Arc<D>,
    events: EventBus,
    flight: SingleFlight,
    runtime: Handle,
}

impl<A, D> Guarded<A, D>
where
    A: Action<D>,
    D: ?Sized + Send + Sync + 'static,
{
    pub fn new(action: A, drive: Arc<D>, events: EventBus, runtime: Handle) -> Self {
        Self {
            action: Arc::new(action),
            drive,
            events,
            flight: SingleFlight::new(),
            runtime,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.flight.is_busy()
    }

    /// Starts a run unless one is in flight.
    pub fn submit(&self, input: A::Input) -> Submission {
        let Some(busy) = self.flight.try_acquire() else {
            debug!(action = A::NAME, "rejected, already running");
            self.events.notice(self.action.busy_notice());
            return Submission::Rejected;
        };
        let action = Arc::clone(&self.action);
        let drive = Arc::clone(&self.drive);
        let events = self.events.clone();
        debug!(action = A::NAME, "submitted");

        let handle = self.runtime.spawn_blocking(move || {
            let _busy = busy;
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| action.run(&drive, input, &events)));
            match outcome {
                Ok(Ok(())) => debug!(action = A::NAME, "finished"),
                Ok(Err(e)) => report::<A, D>(&action, &events, e),
                Err(payload) => {
                    error!(action = A::NAME, panic = %panic_message(payload.as_ref()), "action panicked");
                    events.notice(action.unexpected_notice());
                }
            }
        });
        Submission::Accepted(handle)
    }
}

fn report<A, D>(action: &A, events: &EventBus, err: ActionError)
where
    A: Action<D>,
    D: ?Sized,
{
    match err {
        ActionError::Timeout => {
            warn!(action = A::NAME, "timed out");
            events.notice(action.timeout_notice());
        }
        ActionError::Declined(code) => {
            warn!(action = A::NAME, code = code.code(), "declined");
            events.notice(action.declined_notice(code));
        }
        ActionError::NotFound(what) => {
            warn!(action = A::NAME, %what, "not found");
            events.notice(Notice::error(format!("{what} does not exist"), RESULT_MS));
        }
        ActionError::Invalid(why) => {
            debug!(action = A::NAME, %why, "invalid input");
            events.notice(Notice::error(why, RESULT_MS));
        }
        ActionError::Unexpected(e) => {
            error!(action = A::NAME, error = %format!("{e:#}"), "unexpected failure");
            events.notice(action.unexpected_notice());
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic".to_string()
    }
}
