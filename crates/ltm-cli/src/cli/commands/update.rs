//! `ltm check-update` – compare this build with the latest release.

use anyhow::Result;
use ltm_core::actions::CheckUpdate;
use ltm_core::config::LtmConfig;
use ltm_core::events::EventBus;
use ltm_core::update::{CurlReleaseFeed, ReleaseFeed};
use std::sync::Arc;
use std::time::Duration;

use super::run_guarded;

pub async fn run_check_update(cfg: &LtmConfig) -> Result<()> {
    let update = cfg.update.clone().unwrap_or_default();
    let feed: Arc<dyn ReleaseFeed> =
        Arc::new(CurlReleaseFeed::new(Duration::from_secs(update.timeout_secs)));
    let action = CheckUpdate::new(concat!("v", env!("CARGO_PKG_VERSION")), update.endpoints);
    let events = EventBus::new(cfg.event_capacity);
    run_guarded(action, feed, &events, true).await
}
