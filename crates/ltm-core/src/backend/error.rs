//! Faults raised by drive calls (as opposed to declined status codes).

/// Error returned by a drive call that did not produce a status code.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Connect or read timed out.
    #[error("network timeout")]
    Timeout,
    /// The transfer observer asked to stop at a checkpoint.
    #[error("transfer stopped by user")]
    Stopped,
    /// Anything else (I/O, protocol, parse errors).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            BackendError::Timeout
        } else {
            BackendError::Other(e.into())
        }
    }
}

/// Result alias for drive calls.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_timeout_maps_to_timeout() {
        let e = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(matches!(BackendError::from(e), BackendError::Timeout));
    }

    #[test]
    fn other_io_errors_are_wrapped() {
        let e = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = BackendError::from(e);
        assert!(matches!(err, BackendError::Other(_)));
        assert_eq!(err.to_string(), "nope");
    }
}
