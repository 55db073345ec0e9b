//! One download worker: runs a single job against the backend.

use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

use super::dispatcher::{retire, Inner};
use super::state::Outcome;
use crate::backend::{BackendError, StatusCode, TransferObserver, Transfers};
use crate::control::StopToken;
use crate::events::{Event, Notice};
use crate::guard::panic_message;
use crate::jobs::{DownloadJob, JobFailure, JobKey};
use crate::progress::compute_progress;
use crate::url_model::ResourceKind;

/// Feeds transfer progress back into the pool.
struct WorkerObserver<T: ?Sized> {
    inner: Arc<Inner<T>>,
    key: JobKey,
    epoch: u64,
    token: StopToken,
    /// Text of the last sample that reached 100%.
    done_line: Arc<Mutex<Option<String>>>,
}

impl<T: Transfers + ?Sized> TransferObserver for WorkerObserver<T> {
    fn on_progress(&self, name: &str, total: u64, done: u64) {
        let line = compute_progress(name, total, done);
        if line.rate == 1000 {
            *self.done_line.lock().unwrap_or_else(|p| p.into_inner()) = Some(line.text.clone());
        }
        let mut st = self.inner.lock();
        if let Some(rate) = st.set_rate(&self.key, self.epoch, line.rate) {
            self.inner.events.emit(Event::Progress {
                key: self.key.clone(),
                line: line.text.clone(),
                rate,
            });
            self.inner.publish(&mut st, Some(line.text.as_str()));
        }
    }

    fn on_item_failed(&self, code: StatusCode, item: &str) {
        warn!(job = %self.key, item, code = code.code(), "folder item failed");
        self.inner.events.emit(Event::ItemFailed {
            key: self.key.clone(),
            code,
            item: item.to_string(),
        });
    }

    fn should_stop(&self) -> bool {
        self.token.is_requested()
    }
}

type TransferResult = Result<Result<StatusCode, BackendError>, tokio::task::JoinError>;

fn classify(result: TransferResult, key: &str) -> Outcome {
    match result {
        Ok(Ok(code)) if code.is_success() => Outcome::Completed,
        Ok(Ok(code)) => Outcome::Failed(JobFailure::Declined(code)),
        Ok(Err(BackendError::Stopped)) => Outcome::Stopped,
        Ok(Err(BackendError::Timeout)) => Outcome::Failed(JobFailure::Timeout),
        Ok(Err(BackendError::Other(e))) => {
            error!(job = %key, error = %format!("{e:#}"), "download failed");
            Outcome::Failed(JobFailure::Unexpected(format!("{e:#}")))
        }
        Err(join) => {
            let why = if join.is_panic() {
                panic_message(join.into_panic().as_ref())
            } else {
                join.to_string()
            };
            error!(job = %key, error = %why, "download worker crashed");
            Outcome::Failed(JobFailure::Unexpected(why))
        }
    }
}

pub(super) async fn run<T>(
    inner: Arc<Inner<T>>,
    key: JobKey,
    job: DownloadJob,
    epoch: u64,
    token: StopToken,
) where
    T: Transfers + ?Sized + 'static,
{
    inner
        .events
        .notice(Notice::info(format!("Preparing to download {}", job.name), 0));

    let folder = match ResourceKind::classify(&job.url) {
        ResourceKind::File => false,
        ResourceKind::Folder => true,
        ResourceKind::Unknown => {
            warn!(job = %key, "unrecognized share link");
            let outcome = Outcome::Failed(JobFailure::Declined(StatusCode::UrlInvalid));
            retire(&inner, &key, epoch, &token, outcome, None);
            return;
        }
    };

    let backend = Arc::clone(&inner.backend);
    let done_line = Arc::new(Mutex::new(None));
    let name = job.name.clone();
    let observer = WorkerObserver {
        inner: Arc::clone(&inner),
        key: key.clone(),
        epoch,
        token: token.clone(),
        done_line: Arc::clone(&done_line),
    };
    let result = tokio::task::spawn_blocking(move || {
        if folder {
            backend.download_folder(&job.url, &job.password, &job.dest, &observer)
        } else {
            backend.download_file(&job.url, &job.password, &job.dest, &observer)
        }
    })
    .await;

    let outcome = classify(result, &key);
    match &outcome {
        Outcome::Completed => info!(job = %key, "download complete"),
        Outcome::Stopped => info!(job = %key, "download stopped"),
        Outcome::Failed(f) => warn!(job = %key, failure = %f, "download failed"),
    }
    let final_line = match outcome {
        Outcome::Completed => Some(
            done_line
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .take()
                .unwrap_or_else(|| format!("{name} | Done!")),
        ),
        _ => None,
    };
    retire(&inner, &key, epoch, &token, outcome, final_line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_panic_becomes_unexpected() {
        let join = tokio::task::spawn_blocking(|| -> Result<StatusCode, BackendError> {
            panic!("transfer blew up")
        })
        .await;
        assert_eq!(
            classify(join, "k"),
            Outcome::Failed(JobFailure::Unexpected("transfer blew up".into()))
        );
    }

    async fn outcome_of(result: Result<StatusCode, BackendError>) -> Outcome {
        classify(tokio::task::spawn_blocking(move || result).await, "k")
    }

    #[tokio::test]
    async fn backend_results_map_to_outcomes() {
        assert_eq!(outcome_of(Ok(StatusCode::Success)).await, Outcome::Completed);
        assert_eq!(
            outcome_of(Ok(StatusCode::LackPassword)).await,
            Outcome::Failed(JobFailure::Declined(StatusCode::LackPassword))
        );
        assert_eq!(outcome_of(Err(BackendError::Stopped)).await, Outcome::Stopped);
        assert_eq!(
            outcome_of(Err(BackendError::Timeout)).await,
            Outcome::Failed(JobFailure::Timeout)
        );
    }
}
