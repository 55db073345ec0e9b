//! Test doubles for the integration suites.
#![allow(dead_code)]

use ltm_core::backend::{
    Account, BackendError, BackendResult, FileId, Metadata, StatusCode, TransferObserver,
    Transfers, Uploaded,
};
use ltm_core::events::Event;
use ltm_core::jobs::{DownloadJob, JobRecord, JobStatus, Snapshot};
use ltm_core::update::{Release, ReleaseFeed};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::broadcast::Receiver;

pub const POLL: Duration = Duration::from_millis(20);

/// Download backend whose transfers block until the test opens the gate.
/// Tracks how many transfers overlap.
#[derive(Default)]
pub struct GatedTransfers {
    open: Mutex<bool>,
    cv: Condvar,
    active: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Vec<String>>,
    replies: Mutex<HashMap<String, StatusCode>>,
    meta_calls: Mutex<Vec<String>>,
    dests: Mutex<Vec<PathBuf>>,
    deaf: AtomicBool,
}

impl GatedTransfers {
    pub fn release(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Destinations of every download started, in order.
    pub fn dests(&self) -> Vec<PathBuf> {
        self.dests.lock().unwrap().clone()
    }

    /// Transfers stop checking for stop requests and only wait for the gate.
    pub fn ignore_stop(&self) {
        self.deaf.store(true, Ordering::SeqCst);
    }

    pub fn meta_calls(&self) -> Vec<String> {
        self.meta_calls.lock().unwrap().clone()
    }

    /// Makes the transfer of `url` return `code` once released.
    pub fn reply(&self, url: &str, code: StatusCode) {
        self.replies.lock().unwrap().insert(url.to_string(), code);
    }

    fn transfer(&self, url: &str, observer: &dyn TransferObserver) -> BackendResult<StatusCode> {
        self.started.lock().unwrap().push(url.to_string());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        observer.on_progress(url, 100, 10);
        let result = loop {
            let open = self.open.lock().unwrap();
            if !self.deaf.load(Ordering::SeqCst) && observer.should_stop() {
                break Err(BackendError::Stopped);
            }
            if *open {
                break Ok(());
            }
            let _ = self.cv.wait_timeout(open, Duration::from_millis(5)).unwrap();
        };
        self.active.fetch_sub(1, Ordering::SeqCst);
        result?;
        observer.on_progress(url, 100, 100);
        Ok(self
            .replies
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(StatusCode::Success))
    }
}

impl Transfers for GatedTransfers {
    fn download_file(
        &self,
        url: &str,
        _password: &str,
        dest: &Path,
        observer: &dyn TransferObserver,
    ) -> BackendResult<StatusCode> {
        self.dests.lock().unwrap().push(dest.to_path_buf());
        self.transfer(url, observer)
    }

    fn download_folder(
        &self,
        url: &str,
        _password: &str,
        _dest: &Path,
        observer: &dyn TransferObserver,
    ) -> BackendResult<StatusCode> {
        observer.on_item_failed(StatusCode::PasswordError, "locked.bin");
        self.transfer(url, observer)
    }

    fn upload_file(
        &self,
        path: &Path,
        _folder: FileId,
        observer: &dyn TransferObserver,
    ) -> BackendResult<Uploaded> {
        let status = self.transfer(&path.display().to_string(), observer)?;
        Ok(Uploaded {
            status,
            id: 1,
            is_file: true,
        })
    }

    fn upload_folder(
        &self,
        _path: &Path,
        _folder: FileId,
        _observer: &dyn TransferObserver,
    ) -> BackendResult<StatusCode> {
        Ok(StatusCode::Success)
    }
}

/// Account whose password login blocks until released and counts calls.
#[derive(Default)]
pub struct SlowAccount {
    pub logins: AtomicUsize,
    open: Mutex<bool>,
    cv: Condvar,
}

impl SlowAccount {
    pub fn release(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }
}

impl Account for SlowAccount {
    fn login(&self, _user: &str, _password: &str) -> BackendResult<StatusCode> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
        Ok(StatusCode::Success)
    }

    fn login_by_cookie(&self, _cookie: &str) -> BackendResult<StatusCode> {
        Ok(StatusCode::Failed)
    }

    fn cookie(&self) -> Option<String> {
        Some("session=slow".into())
    }

    fn logout(&self) -> BackendResult<StatusCode> {
        Ok(StatusCode::Success)
    }
}

/// Post-upload settings: passwords are accepted, descriptions declined.
impl Metadata for GatedTransfers {
    fn set_password(&self, id: FileId, password: &str, _is_file: bool) -> BackendResult<StatusCode> {
        self.meta_calls
            .lock()
            .unwrap()
            .push(format!("password {id} {password}"));
        Ok(StatusCode::Success)
    }

    fn set_description(
        &self,
        id: FileId,
        description: &str,
        _is_file: bool,
    ) -> BackendResult<StatusCode> {
        self.meta_calls
            .lock()
            .unwrap()
            .push(format!("description {id} {description}"));
        Ok(StatusCode::Failed)
    }
}

pub fn job(token: &str) -> DownloadJob {
    DownloadJob::new(token, format!("https://share.test/{token}"), "", "/tmp/ltm-test")
}

/// Polls `cond` until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

pub fn status_of(snapshot: &Snapshot<DownloadJob>, token: &str) -> Option<JobStatus> {
    snapshot
        .get(&format!("https://share.test/{token}"))
        .map(|j| j.status())
}

pub fn drain(rx: &mut Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

/// Release feed answering from a fixed table; unknown endpoints time out.
#[derive(Default)]
pub struct StubFeed {
    pub tags: HashMap<String, String>,
    pub asked: Mutex<Vec<String>>,
}

impl StubFeed {
    pub fn with(endpoint: &str, tag: &str) -> Self {
        let mut feed = Self::default();
        feed.tags.insert(endpoint.to_string(), tag.to_string());
        feed
    }
}

impl ReleaseFeed for StubFeed {
    fn latest_release(&self, endpoint: &str) -> BackendResult<Release> {
        self.asked.lock().unwrap().push(endpoint.to_string());
        match self.tags.get(endpoint) {
            Some(tag) => Ok(Release {
                tag_name: tag.clone(),
                body: format!("notes for {tag}"),
            }),
            None => Err(BackendError::Timeout),
        }
    }
}
