//! Result codes returned by drive operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status code returned by every drive call that can be declined.
///
/// The numeric values match the drive protocol so codes can be logged and
/// compared with server-side diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Success,
    Failed,
    IdError,
    PasswordError,
    LackPassword,
    ZipError,
    MkdirError,
    UrlInvalid,
    FileCancelled,
    PathError,
    NetworkError,
    CaptchaError,
}

impl StatusCode {
    pub fn code(self) -> i32 {
        match self {
            StatusCode::Success => 0,
            StatusCode::Failed => -1,
            StatusCode::IdError => -2,
            StatusCode::PasswordError => -3,
            StatusCode::LackPassword => -4,
            StatusCode::ZipError => -5,
            StatusCode::MkdirError => -6,
            StatusCode::UrlInvalid => -7,
            StatusCode::FileCancelled => -8,
            StatusCode::PathError => -9,
            StatusCode::NetworkError => -10,
            StatusCode::CaptchaError => -11,
        }
    }

    /// Maps a raw protocol code; unknown codes become `Failed`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => StatusCode::Success,
            -2 => StatusCode::IdError,
            -3 => StatusCode::PasswordError,
            -4 => StatusCode::LackPassword,
            -5 => StatusCode::ZipError,
            -6 => StatusCode::MkdirError,
            -7 => StatusCode::UrlInvalid,
            -8 => StatusCode::FileCancelled,
            -9 => StatusCode::PathError,
            -10 => StatusCode::NetworkError,
            -11 => StatusCode::CaptchaError,
            _ => StatusCode::Failed,
        }
    }

    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }

    /// Human-readable reason, suitable for user-facing failure messages.
    pub fn reason(self) -> &'static str {
        match self {
            StatusCode::Success => "success",
            StatusCode::UrlInvalid => "invalid share link",
            StatusCode::LackPassword => "password required",
            StatusCode::PasswordError => "wrong password",
            StatusCode::FileCancelled => "share link has expired",
            StatusCode::ZipError => "archive extraction failed",
            StatusCode::NetworkError => "network connection error",
            StatusCode::MkdirError => "could not create folder",
            StatusCode::IdError => "unknown file or folder id",
            StatusCode::PathError => "invalid path",
            StatusCode::CaptchaError => "captcha required",
            StatusCode::Failed => "unknown error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reason(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_back() {
        for status in [
            StatusCode::Success,
            StatusCode::PasswordError,
            StatusCode::NetworkError,
            StatusCode::CaptchaError,
        ] {
            assert_eq!(StatusCode::from_code(status.code()), status);
        }
    }

    #[test]
    fn unknown_code_is_failed() {
        assert_eq!(StatusCode::from_code(42), StatusCode::Failed);
        assert_eq!(StatusCode::from_code(-1), StatusCode::Failed);
    }

    #[test]
    fn display_includes_reason_and_code() {
        assert_eq!(StatusCode::LackPassword.to_string(), "password required (-4)");
    }
}
