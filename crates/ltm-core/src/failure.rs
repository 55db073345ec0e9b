//! Failure taxonomy of background work.
//!
//! `ActionError` is what a single action returns; `JobFailure` is the
//! serialisable value stored in a queue record. Backend faults map onto both.

use crate::backend::{BackendError, StatusCode};
use crate::jobs::JobFailure;

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("network timeout")]
    Timeout,
    /// The backend answered with a non-success status.
    #[error("declined: {}", .0.reason())]
    Declined(StatusCode),
    /// A local resource is missing.
    #[error("not found: {0}")]
    NotFound(String),
    /// Caller input rejected before any backend call.
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<BackendError> for ActionError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Timeout => ActionError::Timeout,
            BackendError::Stopped => ActionError::Unexpected(anyhow::anyhow!("operation stopped")),
            BackendError::Other(e) => ActionError::Unexpected(e),
        }
    }
}

impl From<ActionError> for JobFailure {
    fn from(e: ActionError) -> Self {
        match e {
            ActionError::Timeout => JobFailure::Timeout,
            ActionError::Declined(code) => JobFailure::Declined(code),
            ActionError::NotFound(what) => JobFailure::NotFound(what),
            ActionError::Invalid(why) => JobFailure::Unexpected(why),
            ActionError::Unexpected(e) => JobFailure::Unexpected(format!("{e:#}")),
        }
    }
}

/// Turns a backend status into `Ok(())` or a `Declined` error.
pub fn check(code: StatusCode) -> Result<(), ActionError> {
    if code.is_success() {
        Ok(())
    } else {
        Err(ActionError::Declined(code))
    }
}
