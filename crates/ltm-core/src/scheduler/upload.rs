//! Sequential upload queue.
//!
//! A single loop drains the pending paths one at a time. A missing path,
//! a declined upload, a timeout or an unexpected fault is stored on that
//! job's record and the loop moves on to the next path.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::io::ErrorKind;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::backend::{BackendResult, FileId, Metadata, StatusCode, TransferObserver, Transfers};
use crate::events::{Event, EventBus, Notice};
use crate::failure::{check, ActionError};
use crate::guard::{panic_message, RESULT_MS};
use crate::jobs::{JobFailure, JobKey, JobRecord, Snapshot, UploadJob};
use crate::progress::compute_progress;

use super::state::RUNNING_MAX_RATE;

struct UploadState {
    pending: VecDeque<JobKey>,
    queued: HashSet<JobKey>,
    records: Snapshot<UploadJob>,
    active: Option<JobKey>,
    /// The active upload was removed; its result is dropped.
    discard_active: bool,
    draining: bool,
}

impl UploadState {
    fn put(&mut self, record: UploadJob) {
        Arc::make_mut(&mut self.records).insert(record.key(), record);
    }

    fn update(&mut self, key: &str, f: impl FnOnce(&UploadJob) -> UploadJob) {
        if let Some(old) = self.records.get(key) {
            let new = f(old);
            self.put(new);
        }
    }
}

struct UploadInner<D: ?Sized> {
    backend: Arc<D>,
    events: EventBus,
    runtime: Handle,
    state: Mutex<UploadState>,
}

impl<D: ?Sized> UploadInner<D> {
    fn lock(&self) -> MutexGuard<'_, UploadState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn publish(&self, st: &UploadState) {
        self.events.emit(Event::Uploads(Arc::clone(&st.records)));
    }
}

/// Upload queue over a drive that can transfer and tag files.
pub struct UploadQueue<D: ?Sized> {
    inner: Arc<UploadInner<D>>,
}

impl<D: ?Sized> Clone for UploadQueue<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> UploadQueue<D>
where
    D: Transfers + Metadata + ?Sized + 'static,
{
    pub fn new(backend: Arc<D>, events: EventBus, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(UploadInner {
                backend,
                events,
                runtime,
                state: Mutex::new(UploadState {
                    pending: VecDeque::new(),
                    queued: HashSet::new(),
                    records: Arc::new(BTreeMap::new()),
                    active: None,
                    discard_active: false,
                    draining: false,
                }),
            }),
        }
    }

    pub fn add(&self, job: UploadJob) {
        self.add_many(std::iter::once(job));
    }

    /// Queues uploads; a path already pending or uploading is ignored. A path
    /// removed while it was uploading can be queued again.
    pub fn add_many(&self, jobs: impl IntoIterator<Item = UploadJob>) {
        let mut st = self.inner.lock();
        for job in jobs {
            let key = job.key();
            let uploading = st.active.as_deref() == Some(key.as_str()) && !st.discard_active;
            if st.queued.contains(&key) || uploading {
                debug!(job = %key, "duplicate upload ignored");
                continue;
            }
            st.put(job.requeued());
            st.queued.insert(key.clone());
            st.pending.push_back(key);
        }
        self.inner.publish(&st);
        if !st.draining && !st.pending.is_empty() {
            st.draining = true;
            self.inner.runtime.spawn(drain(Arc::clone(&self.inner)));
        }
    }

    /// Drops a job record. A pending job is skipped; the upload in progress
    /// runs to completion but its result is discarded.
    pub fn remove(&self, key: &str) {
        let mut st = self.inner.lock();
        if st.active.as_deref() == Some(key) {
            st.discard_active = true;
        }
        st.pending.retain(|k| k != key);
        st.queued.remove(key);
        Arc::make_mut(&mut st.records).remove(key);
        self.inner.publish(&st);
    }

    pub fn snapshot(&self) -> Snapshot<UploadJob> {
        Arc::clone(&self.inner.lock().records)
    }

    /// True when nothing is pending or uploading.
    pub fn is_idle(&self) -> bool {
        let st = self.inner.lock();
        !st.draining && st.pending.is_empty()
    }
}

async fn drain<D>(inner: Arc<UploadInner<D>>)
where
    D: Transfers + Metadata + ?Sized + 'static,
{
    loop {
        let (key, job) = {
            let mut st = inner.lock();
            let Some(key) = st.pending.pop_front() else {
                st.draining = false;
                return;
            };
            st.queued.remove(&key);
            let Some(job) = st.records.get(&key).cloned() else {
                continue;
            };
            st.active = Some(key.clone());
            (key, job)
        };

        let result = upload_one(&inner, &key, job).await;

        let mut st = inner.lock();
        st.active = None;
        if std::mem::take(&mut st.discard_active) {
            debug!(job = %key, "removed upload finished; result dropped");
            inner.publish(&st);
            continue;
        }
        match result {
            Ok(line) => {
                info!(job = %key, "upload complete");
                st.update(&key, |r| r.with_rate(1000).with_running(false));
                inner.events.emit(Event::Progress {
                    key: key.clone(),
                    line,
                    rate: 1000,
                });
            }
            Err(failure) => {
                warn!(job = %key, %failure, "upload failed");
                st.update(&key, |r| r.with_failure(failure));
            }
        }
        inner.publish(&st);
    }
}

struct UploadObserver<D: ?Sized> {
    inner: Arc<UploadInner<D>>,
    key: JobKey,
    done_line: Arc<Mutex<Option<String>>>,
}

impl<D: ?Sized + Send + Sync> TransferObserver for UploadObserver<D> {
    fn on_progress(&self, name: &str, total: u64, done: u64) {
        let line = compute_progress(name, total, done);
        if line.rate == 1000 {
            *self.done_line.lock().unwrap_or_else(|p| p.into_inner()) = Some(line.text.clone());
        }
        let rate = line.rate.min(RUNNING_MAX_RATE);
        let mut st = self.inner.lock();
        if st.active.as_deref() != Some(self.key.as_str())
            || st.discard_active
            || st.records.get(&self.key).map_or(true, |r| r.rate >= rate)
        {
            return;
        }
        st.update(&self.key, |r| r.with_rate(rate));
        self.inner.events.emit(Event::Progress {
            key: self.key.clone(),
            line: line.text,
            rate,
        });
        self.inner.publish(&st);
    }

    fn on_item_failed(&self, code: StatusCode, item: &str) {
        warn!(job = %self.key, item, code = code.code(), "upload item failed");
        self.inner.events.emit(Event::ItemFailed {
            key: self.key.clone(),
            code,
            item: item.to_string(),
        });
    }
}

async fn upload_one<D>(
    inner: &Arc<UploadInner<D>>,
    key: &JobKey,
    job: UploadJob,
) -> Result<String, JobFailure>
where
    D: Transfers + Metadata + ?Sized + 'static,
{
    let meta = match tokio::fs::metadata(&job.path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let shown = job.path.display().to_string();
            inner
                .events
                .notice(Notice::error(format!("{shown} does not exist"), RESULT_MS));
            return Err(JobFailure::NotFound(shown));
        }
        Err(e) => return Err(JobFailure::Unexpected(e.to_string())),
    };

    let backend = Arc::clone(&inner.backend);
    let events = inner.events.clone();
    let done_line = Arc::new(Mutex::new(None));
    let observer = UploadObserver {
        inner: Arc::clone(inner),
        key: key.clone(),
        done_line: Arc::clone(&done_line),
    };
    let result = tokio::task::spawn_blocking(move || -> Result<(), ActionError> {
        if meta.is_dir() {
            return check(backend.upload_folder(&job.path, job.folder_id, &observer)?);
        }
        let uploaded = backend.upload_file(&job.path, job.folder_id, &observer)?;
        check(uploaded.status)?;
        apply_directives(&*backend, &job, uploaded.id, uploaded.is_file, &events);
        Ok(())
    })
    .await;

    match result {
        Ok(Ok(())) => {
            let name = job_name(key);
            inner
                .events
                .notice(Notice::success(format!("Uploaded {name}"), RESULT_MS));
            let line = done_line.lock().unwrap_or_else(|p| p.into_inner()).take();
            Ok(line.unwrap_or_else(|| format!("{name} | Done!")))
        }
        Ok(Err(e)) => {
            if let ActionError::Unexpected(err) = &e {
                error!(job = %key, error = %format!("{err:#}"), "upload failed unexpectedly");
            }
            Err(e.into())
        }
        Err(join) => {
            let why = if join.is_panic() {
                panic_message(join.into_panic().as_ref())
            } else {
                join.to_string()
            };
            error!(job = %key, error = %why, "upload worker crashed");
            Err(JobFailure::Unexpected(why))
        }
    }
}

/// Applies the job's post-upload password/description. Failures only warn.
fn apply_directives<D>(
    backend: &D,
    job: &UploadJob,
    id: FileId,
    is_file: bool,
    events: &EventBus,
) where
    D: Metadata + ?Sized,
{
    if let Some(password) = &job.password {
        let result = backend.set_password(id, password, is_file);
        warn_on_failure(result, "password", job, events);
    }
    if let Some(description) = &job.description {
        let result = backend.set_description(id, description, is_file);
        warn_on_failure(result, "description", job, events);
    }
}

fn warn_on_failure(
    result: BackendResult<StatusCode>,
    what: &str,
    job: &UploadJob,
    events: &EventBus,
) {
    let reason = match result {
        Ok(code) if code.is_success() => return,
        Ok(code) => code.reason().to_string(),
        Err(e) => e.to_string(),
    };
    let key = job.key();
    warn!(job = %key, what, %reason, "post-upload step failed");
    events.notice(Notice::warning(
        format!("Uploaded {}, but setting its {what} failed: {reason}", job_name(&key)),
        RESULT_MS,
    ));
}

fn job_name(key: &str) -> &str {
    std::path::Path::new(key)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(key)
}
