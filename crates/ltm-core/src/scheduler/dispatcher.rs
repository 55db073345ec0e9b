//! Bounded download pool.
//!
//! `add` queues jobs keyed by share URL and makes sure one dispatch loop is
//! running. The loop pops queued keys while fewer than `ceiling` workers are
//! in flight and otherwise idles until a worker retires (or the poll interval
//! passes). Every transition republishes the snapshot on the event bus.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::debug;

use super::state::{Outcome, PoolState, Signal};
use super::worker;
use crate::backend::Transfers;
use crate::control::{JobControl, StopToken};
use crate::events::{Event, EventBus};
use crate::jobs::{DownloadJob, JobKey, JobRecord, Snapshot};

pub(super) struct Inner<T: ?Sized> {
    pub backend: Arc<T>,
    pub events: EventBus,
    control: JobControl,
    runtime: Handle,
    poll: Duration,
    wake: Notify,
    state: Mutex<PoolState>,
}

impl<T: ?Sized> Inner<T> {
    pub fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Emits the snapshot and, if it changed, the aggregate status line.
    /// Called with the lock held so events leave in transition order.
    pub fn publish(&self, st: &mut PoolState, progress_line: Option<&str>) {
        self.events.emit(Event::Downloads(st.records()));
        if let Some(line) = st.status_update(progress_line) {
            self.events.emit(Event::Status(line));
        }
    }
}

/// Download dispatcher over a `Transfers` backend. Cloning shares the pool.
pub struct DownloadDispatcher<T: ?Sized> {
    inner: Arc<Inner<T>>,
}

impl<T: ?Sized> Clone for DownloadDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> DownloadDispatcher<T>
where
    T: Transfers + ?Sized + 'static,
{
    /// `ceiling` is clamped to at least one; `poll` bounds the idle wait at
    /// the ceiling.
    pub fn new(
        backend: Arc<T>,
        events: EventBus,
        runtime: Handle,
        ceiling: usize,
        poll: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                events,
                control: JobControl::new(),
                runtime,
                poll,
                wake: Notify::new(),
                state: Mutex::new(PoolState::new(ceiling)),
            }),
        }
    }

    /// Queues a job; a key already pending or running is ignored.
    pub fn add(&self, job: DownloadJob) {
        self.add_many(std::iter::once(job));
    }

    pub fn add_many(&self, jobs: impl IntoIterator<Item = DownloadJob>) {
        let mut st = self.inner.lock();
        let mut changed = false;
        for job in jobs {
            let key = job.key();
            if st.add(job) {
                debug!(job = %key, "queued");
                changed = true;
            } else {
                debug!(job = %key, "duplicate ignored");
            }
        }
        if changed {
            self.inner.publish(&mut st, None);
            ensure_loop(&self.inner, &mut st);
        }
    }

    /// Resumes a stopped job (or queues an unknown one).
    pub fn start(&self, job: DownloadJob) {
        let key = job.key();
        let mut st = self.inner.lock();
        if st.start(job) {
            debug!(job = %key, "started");
            self.inner.publish(&mut st, None);
            ensure_loop(&self.inner, &mut st);
        }
    }

    /// Stops a job. A running transfer halts at its next chunk checkpoint.
    pub fn stop(&self, key: &str) {
        let mut st = self.inner.lock();
        if st.stop(key) == Signal::StopWorker {
            self.inner.control.request_stop(key);
        }
        debug!(job = %key, "stop requested");
        self.inner.publish(&mut st, None);
    }

    /// Drops a job from the snapshot, stopping its worker if one runs.
    pub fn remove(&self, key: &str) {
        let mut st = self.inner.lock();
        if st.remove(key) == Signal::StopWorker {
            self.inner.control.request_stop(key);
        }
        debug!(job = %key, "removed");
        self.inner.publish(&mut st, None);
    }

    /// Changes the ceiling for subsequent dispatches; running workers are
    /// never preempted.
    pub fn set_concurrency(&self, ceiling: usize) {
        self.inner.lock().ceiling = ceiling.max(1);
        self.inner.wake.notify_one();
    }

    pub fn snapshot(&self) -> Snapshot<DownloadJob> {
        self.inner.lock().records()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }

    pub fn ceiling(&self) -> usize {
        self.inner.lock().ceiling
    }

    /// True when nothing is queued or running.
    pub fn is_idle(&self) -> bool {
        let st = self.inner.lock();
        st.in_flight == 0 && !st.has_pending()
    }
}

/// Starts the dispatch loop unless one is already running.
fn ensure_loop<T>(inner: &Arc<Inner<T>>, st: &mut PoolState)
where
    T: Transfers + ?Sized + 'static,
{
    if !st.dispatching {
        st.dispatching = true;
        inner.runtime.spawn(dispatch_loop(Arc::clone(inner)));
    }
}

async fn dispatch_loop<T>(inner: Arc<Inner<T>>)
where
    T: Transfers + ?Sized + 'static,
{
    loop {
        let next = {
            let mut st = inner.lock();
            if !st.has_pending() {
                st.dispatching = false;
                debug!("dispatch loop idle");
                return;
            }
            match st.next_dispatch() {
                Some(d) => {
                    let token = inner.control.register(&d.key);
                    debug!(job = %d.key, in_flight = st.in_flight, ceiling = st.ceiling, "dispatching");
                    inner.publish(&mut st, None);
                    Some((d, token))
                }
                None => None,
            }
        };
        match next {
            Some((d, token)) => {
                inner
                    .runtime
                    .spawn(worker::run(Arc::clone(&inner), d.key, d.job, d.epoch, token));
            }
            None => {
                let _ = tokio::time::timeout(inner.poll, inner.wake.notified()).await;
            }
        }
    }
}

/// Called by a worker when it exits, whatever the outcome. `final_line` is
/// published as the 100% progress sample when a completed run still owns
/// its key.
pub(super) fn retire<T>(
    inner: &Arc<Inner<T>>,
    key: &JobKey,
    epoch: u64,
    token: &StopToken,
    outcome: Outcome,
    final_line: Option<String>,
) where
    T: Transfers + ?Sized + 'static,
{
    let mut st = inner.lock();
    inner.control.unregister(key, token);
    let completed = outcome == Outcome::Completed && st.owns(key, epoch);
    if st.retire(key, epoch, outcome) {
        debug!(job = %key, "re-queued after stop");
        ensure_loop(inner, &mut st);
    }
    if let Some(line) = final_line.filter(|_| completed) {
        inner.events.emit(Event::Progress {
            key: key.clone(),
            line,
            rate: 1000,
        });
    }
    inner.publish(&mut st, None);
    drop(st);
    inner.wake.notify_one();
}
