//! Bookkeeping of the download pool.
//!
//! Everything here runs under the dispatcher's mutex and never blocks. Each
//! job key has at most one slot; the slot phase decides what `add`, `start`,
//! `stop`, `remove` and a retiring worker do with the key.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use crate::jobs::{DownloadJob, JobFailure, JobKey, JobRecord, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Phase {
    /// In the pending queue.
    Queued,
    /// A worker owns the key.
    Running,
    /// Stop requested; the worker has not exited yet. `restart` re-queues
    /// the key once it does.
    Stopping { restart: bool },
    /// Removed by the caller while its worker was still running.
    Removing,
    /// Removed and then submitted again while the old worker was still
    /// running. The old outcome is discarded; with `queue` the new record is
    /// queued once the old worker exits.
    Readded { queue: bool },
    /// Stopped before completion; `start` re-queues it.
    Idle,
    /// Completed or failed.
    Done,
}

/// Highest rate a job shows while its worker is still running.
pub(super) const RUNNING_MAX_RATE: u16 = 999;

#[derive(Debug, Clone, Copy)]
struct Slot {
    epoch: u64,
    phase: Phase,
}

/// How a worker ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Outcome {
    Completed,
    Stopped,
    Failed(JobFailure),
}

/// A job popped for a new worker.
#[derive(Debug)]
pub(super) struct Dispatch {
    pub key: JobKey,
    pub job: DownloadJob,
    pub epoch: u64,
}

/// What the caller must do after a `stop`/`remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Signal {
    /// Nothing to signal (unknown key, or not running).
    None,
    /// A worker is running: set its stop token.
    StopWorker,
}

#[derive(Debug)]
pub(super) struct PoolState {
    pending: VecDeque<JobKey>,
    records: Snapshot<DownloadJob>,
    slots: HashMap<JobKey, Slot>,
    pub in_flight: usize,
    pub ceiling: usize,
    /// A dispatch loop is running (or about to).
    pub dispatching: bool,
    next_epoch: u64,
    last_status: Option<String>,
}

impl PoolState {
    pub fn new(ceiling: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            records: Arc::new(BTreeMap::new()),
            slots: HashMap::new(),
            in_flight: 0,
            ceiling: ceiling.max(1),
            dispatching: false,
            next_epoch: 0,
            last_status: None,
        }
    }

    pub fn records(&self) -> Snapshot<DownloadJob> {
        Arc::clone(&self.records)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn put(&mut self, record: DownloadJob) {
        Arc::make_mut(&mut self.records).insert(record.key(), record);
    }

    fn update(&mut self, key: &str, f: impl FnOnce(&DownloadJob) -> DownloadJob) {
        if let Some(old) = self.records.get(key) {
            let new = f(old);
            self.put(new);
        }
    }

    fn phase(&self, key: &str) -> Option<Phase> {
        self.slots.get(key).map(|s| s.phase)
    }

    fn set_phase(&mut self, key: &str, phase: Phase) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.phase = phase;
        }
    }

    fn enqueue(&mut self, record: DownloadJob) {
        let key = record.key();
        self.put(record.requeued());
        let epoch = self.slots.get(&key).map(|s| s.epoch).unwrap_or(0);
        self.slots.insert(
            key.clone(),
            Slot {
                epoch,
                phase: Phase::Queued,
            },
        );
        self.pending.push_back(key);
    }

    /// Queues a job unless its key is pending or owned by a worker.
    /// Returns whether anything changed.
    pub fn add(&mut self, job: DownloadJob) -> bool {
        let key = job.key();
        match self.phase(&key) {
            Some(
                Phase::Queued
                | Phase::Running
                | Phase::Stopping { .. }
                | Phase::Readded { queue: true },
            ) => false,
            Some(Phase::Removing | Phase::Readded { queue: false }) => {
                self.put(job.requeued());
                self.set_phase(&key, Phase::Readded { queue: true });
                true
            }
            Some(Phase::Idle | Phase::Done) | None => {
                self.enqueue(job);
                true
            }
        }
    }

    /// Resumes a stopped or finished job; a key never seen is added.
    pub fn start(&mut self, job: DownloadJob) -> bool {
        let key = job.key();
        match self.phase(&key) {
            None => self.add(job),
            Some(Phase::Queued | Phase::Running) => false,
            Some(Phase::Stopping { restart: true } | Phase::Readded { queue: true }) => false,
            Some(Phase::Readded { queue: false }) => {
                self.set_phase(&key, Phase::Readded { queue: true });
                self.update(&key, |r| r.with_running(true));
                true
            }
            Some(Phase::Stopping { restart: false }) => {
                self.set_phase(&key, Phase::Stopping { restart: true });
                self.update(&key, |r| r.with_running(true));
                true
            }
            Some(Phase::Removing) => self.add(job),
            Some(Phase::Idle | Phase::Done) => {
                let record = self.records.get(&key).cloned().unwrap_or(job);
                self.enqueue(record);
                true
            }
        }
    }

    pub fn stop(&mut self, key: &str) -> Signal {
        match self.phase(key) {
            Some(Phase::Queued) => {
                self.pending.retain(|k| k != key);
                self.set_phase(key, Phase::Idle);
                self.update(key, |r| r.with_running(false));
                Signal::None
            }
            Some(Phase::Running) => {
                self.set_phase(key, Phase::Stopping { restart: false });
                self.update(key, |r| r.with_running(false));
                Signal::StopWorker
            }
            Some(Phase::Stopping { restart: true }) => {
                self.set_phase(key, Phase::Stopping { restart: false });
                self.update(key, |r| r.with_running(false));
                Signal::None
            }
            Some(Phase::Readded { queue: true }) => {
                self.set_phase(key, Phase::Readded { queue: false });
                self.update(key, |r| r.with_running(false));
                Signal::None
            }
            _ => Signal::None,
        }
    }

    /// Drops the record. A running worker is asked to stop and its slot is
    /// kept until it retires, so the key never has two live workers.
    pub fn remove(&mut self, key: &str) -> Signal {
        let signal = match self.phase(key) {
            None => return Signal::None,
            Some(Phase::Running) => {
                self.set_phase(key, Phase::Removing);
                Signal::StopWorker
            }
            Some(Phase::Stopping { .. }) => {
                self.set_phase(key, Phase::Removing);
                Signal::None
            }
            Some(Phase::Removing) => Signal::None,
            Some(Phase::Readded { .. }) => {
                self.set_phase(key, Phase::Removing);
                Signal::None
            }
            Some(Phase::Queued) => {
                self.pending.retain(|k| k != key);
                self.slots.remove(key);
                Signal::None
            }
            Some(Phase::Idle | Phase::Done) => {
                self.slots.remove(key);
                Signal::None
            }
        };
        Arc::make_mut(&mut self.records).remove(key);
        signal
    }

    /// Pops the next queued job if a slot is free.
    pub fn next_dispatch(&mut self) -> Option<Dispatch> {
        if self.in_flight >= self.ceiling {
            return None;
        }
        while let Some(key) = self.pending.pop_front() {
            if self.phase(&key) != Some(Phase::Queued) {
                continue;
            }
            let Some(job) = self.records.get(&key).cloned() else {
                self.slots.remove(&key);
                continue;
            };
            self.next_epoch += 1;
            let epoch = self.next_epoch;
            self.slots.insert(
                key.clone(),
                Slot {
                    epoch,
                    phase: Phase::Running,
                },
            );
            self.in_flight += 1;
            return Some(Dispatch { key, job, epoch });
        }
        None
    }

    /// True while the worker started with `epoch` still owns `key`.
    pub fn owns(&self, key: &str, epoch: u64) -> bool {
        self.slots.get(key).is_some_and(|s| {
            s.epoch == epoch && matches!(s.phase, Phase::Running | Phase::Stopping { .. })
        })
    }

    /// Records a progress rate. Returns the stored rate when the record
    /// changed.
    ///
    /// Rates never go down within one run, and stay below 1000 until the
    /// worker retires as completed.
    pub fn set_rate(&mut self, key: &str, epoch: u64, rate: u16) -> Option<u16> {
        let rate = rate.min(RUNNING_MAX_RATE);
        if !self.owns(key, epoch) || self.records.get(key).map_or(true, |r| r.rate >= rate) {
            return None;
        }
        self.update(key, |r| r.with_rate(rate));
        Some(rate)
    }

    /// Frees the worker's slot and applies its outcome. Returns whether the
    /// key was re-queued.
    pub fn retire(&mut self, key: &str, epoch: u64, outcome: Outcome) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Some(slot) = self.slots.get(key).copied() else {
            return false;
        };
        if slot.epoch != epoch {
            return false;
        }
        match (slot.phase, outcome) {
            (Phase::Removing, _) => {
                self.slots.remove(key);
                false
            }
            (Phase::Readded { queue: true }, _) => match self.records.get(key).cloned() {
                Some(record) => {
                    self.enqueue(record);
                    true
                }
                None => {
                    self.slots.remove(key);
                    false
                }
            },
            (Phase::Readded { queue: false }, _) => {
                self.set_phase(key, Phase::Idle);
                false
            }
            (Phase::Running | Phase::Stopping { .. }, Outcome::Completed) => {
                self.set_phase(key, Phase::Done);
                self.update(key, |r| r.with_rate(1000).with_running(false));
                false
            }
            (Phase::Running | Phase::Stopping { .. }, Outcome::Failed(failure)) => {
                self.set_phase(key, Phase::Done);
                self.update(key, |r| r.with_failure(failure));
                false
            }
            (Phase::Stopping { restart: true }, Outcome::Stopped) => {
                if let Some(record) = self.records.get(key).cloned() {
                    self.enqueue(record);
                    true
                } else {
                    self.slots.remove(key);
                    false
                }
            }
            (Phase::Running | Phase::Stopping { restart: false }, Outcome::Stopped) => {
                self.set_phase(key, Phase::Idle);
                self.update(key, |r| r.with_running(false));
                false
            }
            (Phase::Queued | Phase::Idle | Phase::Done, _) => false,
        }
    }

    /// Aggregate status line, or `None` when unchanged or nothing runs.
    ///
    /// With one job in flight the line is that job's progress text (when
    /// known); otherwise it counts the running tasks.
    pub fn status_update(&mut self, progress_line: Option<&str>) -> Option<String> {
        let line = match self.in_flight {
            0 => {
                self.last_status = None;
                return None;
            }
            1 => progress_line?.to_string(),
            n => format!("{n} download tasks running"),
        };
        if self.last_status.as_deref() == Some(line.as_str()) {
            return None;
        }
        self.last_status = Some(line.clone());
        Some(line)
    }
}
