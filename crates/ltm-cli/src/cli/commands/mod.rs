//! CLI command handlers. Each command group is in its own file.

mod browse;
mod download;
mod edit;
mod recycle;
mod update;
mod upload;

use anyhow::{Context, Result};
use ltm_core::backend::MirrorDrive;
use ltm_core::config::LtmConfig;
use ltm_core::events::{Event, EventBus};
use ltm_core::guard::{Action, Guarded};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

use super::render::{print_event, print_pending};

pub use browse::{run_info, run_link, run_ls};
pub use download::run_download;
pub use edit::{run_edit, run_mkdir, run_mv, run_passwd, run_rm};
pub use recycle::run_recycle;
pub use update::run_check_update;
pub use upload::run_upload;

/// Drive, event bus and settings shared by the commands of one invocation.
pub struct Session {
    pub cfg: LtmConfig,
    pub drive: Arc<MirrorDrive>,
    pub events: EventBus,
}

impl Session {
    pub fn open(cfg: LtmConfig, drive: Option<PathBuf>, host: &str) -> Result<Self> {
        let root = drive
            .or_else(|| cfg.drive_root.clone())
            .context("no drive directory: pass --drive or set drive_root in config.toml")?;
        let drive = MirrorDrive::open(&root, host)
            .with_context(|| format!("opening drive at {}", root.display()))?;
        tracing::debug!(root = %root.display(), "drive opened");
        let events = EventBus::new(cfg.event_capacity);
        Ok(Self {
            cfg,
            drive: Arc::new(drive),
            events,
        })
    }

    /// Runs one guarded action to completion and prints what it reported.
    pub async fn act<A>(&self, action: A, input: A::Input) -> Result<()>
    where
        A: Action<MirrorDrive>,
    {
        run_guarded(action, Arc::clone(&self.drive), &self.events, input).await
    }
}

pub(crate) async fn run_guarded<A, D>(
    action: A,
    drive: Arc<D>,
    events: &EventBus,
    input: A::Input,
) -> Result<()>
where
    A: Action<D>,
    D: ?Sized + Send + Sync + 'static,
{
    let mut rx = events.subscribe();
    let guarded = Guarded::new(action, drive, events.clone(), Handle::current());
    guarded.submit(input).finished().await;
    print_pending(&mut rx);
    Ok(())
}

/// Prints events as they arrive until `idle` reports the queue drained.
pub(crate) async fn follow(rx: &mut Receiver<Event>, idle: impl Fn() -> bool) {
    const TICK: Duration = Duration::from_millis(200);
    loop {
        match tokio::time::timeout(TICK, rx.recv()).await {
            Ok(Ok(event)) => print_event(&event),
            Ok(Err(RecvError::Lagged(n))) => tracing::debug!(missed = n, "event printer lagged"),
            Ok(Err(RecvError::Closed)) => break,
            Err(_) => {}
        }
        if idle() {
            print_pending(rx);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_needs_a_drive_directory() {
        let err = Session::open(LtmConfig::default(), None, "share.local")
            .err()
            .unwrap();
        assert!(err.to_string().contains("--drive"));
    }

    #[test]
    fn session_prefers_the_flag_over_config() {
        let flag = tempfile::tempdir().unwrap();
        let configured = tempfile::tempdir().unwrap();
        let cfg = LtmConfig {
            drive_root: Some(configured.path().to_path_buf()),
            ..LtmConfig::default()
        };
        let session = Session::open(cfg, Some(flag.path().to_path_buf()), "share.local").unwrap();
        assert_eq!(session.drive.root(), flag.path());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn guarded_listing_runs_against_the_drive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        let session = Session::open(LtmConfig::default(), Some(dir.path().into()), "h").unwrap();
        let mut rx = session.events.subscribe();
        session
            .act(ltm_core::actions::ListRefresh, ltm_core::actions::ListRequest::all(-1))
            .await
            .unwrap();
        let mut saw_listing = false;
        while let Ok(event) = rx.try_recv() {
            if let Event::Listing(l) = event {
                saw_listing = l.files.map(|f| f.len()) == Some(1);
            }
        }
        assert!(saw_listing);
    }
}
