//! Release feed and version comparison for update checks.

mod feed;

use serde::Deserialize;

pub use feed::CurlReleaseFeed;

use crate::backend::BackendResult;

/// Latest release as published by a release API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub body: String,
}

/// Source of release information. Blocking, like the drive calls.
pub trait ReleaseFeed: Send + Sync {
    fn latest_release(&self, endpoint: &str) -> BackendResult<Release>;
}

/// Result of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    Available { tag: String, notes: String },
    UpToDate,
    Failed(String),
}

/// `(major, minor, patch)` of a `vMAJOR.MINOR.PATCH[-suffix]` tag.
///
/// The leading `v` and any `-suffix` are ignored; missing minor or patch
/// parts count as zero.
pub fn parse_version(tag: &str) -> Option<(u32, u32, u32)> {
    let core = tag.trim().trim_start_matches(['v', 'V']);
    let core = core.split('-').next().unwrap_or(core);
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map(str::parse).transpose().ok()?.unwrap_or(0);
    let patch = parts.next().map(str::parse).transpose().ok()?.unwrap_or(0);
    Some((major, minor, patch))
}

/// True when `remote` names a strictly newer version than `local`.
/// Unparseable tags are never newer.
pub fn is_newer(local: &str, remote: &str) -> bool {
    match (parse_version(local), parse_version(remote)) {
        (Some(l), Some(r)) => r > l,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags() {
        assert_eq!(parse_version("v0.3.1"), Some((0, 3, 1)));
        assert_eq!(parse_version("1.10.0-beta.2"), Some((1, 10, 0)));
        assert_eq!(parse_version("v2"), Some((2, 0, 0)));
        assert_eq!(parse_version("nightly"), None);
        assert_eq!(parse_version("v1.x.0"), None);
    }

    #[test]
    fn tuple_order_not_weighted_sum() {
        // Equal under a 100/10/1 weighted sum.
        assert!(is_newer("v0.2.10", "v0.3.0"));
        assert!(!is_newer("v0.3.0", "v0.2.10"));
        assert!(!is_newer("v1.0.0", "v1.0.0-rc1"));
        assert!(!is_newer("v1.0.0", "garbage"));
    }

    #[test]
    fn release_json() {
        let r: Release =
            serde_json::from_str(r#"{"tag_name":"v0.4.0","body":"notes","id":1}"#).unwrap();
        assert_eq!(r.tag_name, "v0.4.0");
        let r: Release = serde_json::from_str(r#"{"tag_name":"v0.4.0"}"#).unwrap();
        assert_eq!(r.body, "");
    }
}
