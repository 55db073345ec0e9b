//! Release lookup over HTTP with libcurl.

use anyhow::{anyhow, Context};
use std::time::Duration;

use super::{Release, ReleaseFeed};
use crate::backend::{BackendError, BackendResult};

const USER_AGENT: &str = concat!("ltm/", env!("CARGO_PKG_VERSION"));

/// Fetches `releases/latest`-style JSON documents.
#[derive(Debug, Clone)]
pub struct CurlReleaseFeed {
    timeout: Duration,
}

impl CurlReleaseFeed {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

fn curl_error(e: curl::Error) -> BackendError {
    if e.is_operation_timedout() {
        BackendError::Timeout
    } else {
        BackendError::Other(anyhow!(e).context("release request failed"))
    }
}

impl ReleaseFeed for CurlReleaseFeed {
    /// Runs on the current thread; call from `spawn_blocking`.
    fn latest_release(&self, endpoint: &str) -> BackendResult<Release> {
        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(endpoint).map_err(curl_error)?;
        easy.useragent(USER_AGENT).map_err(curl_error)?;
        easy.follow_location(true).map_err(curl_error)?;
        easy.connect_timeout(self.timeout).map_err(curl_error)?;
        easy.timeout(self.timeout).map_err(curl_error)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(curl_error)?;
            transfer.perform().map_err(curl_error)?;
        }

        let code = easy.response_code().map_err(curl_error)?;
        if !(200..300).contains(&code) {
            return Err(anyhow!("{endpoint} returned HTTP {code}").into());
        }
        let release = serde_json::from_slice(&body)
            .with_context(|| format!("unexpected release document from {endpoint}"))?;
        Ok(release)
    }
}
