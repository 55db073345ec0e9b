//! Job records for the transfer queues.
//!
//! Records are values: every state change builds a new record (`with_*`) that
//! replaces the old one under the same key in the published snapshot, so a
//! snapshot an observer holds never changes underneath it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::{FileId, StatusCode};

/// Identity of a job: the share URL for downloads, the local path for uploads.
pub type JobKey = String;

/// Published view of a queue: job key -> current record.
pub type Snapshot<J> = Arc<BTreeMap<JobKey, J>>;

/// Why a job ended without completing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum JobFailure {
    #[error("network timeout")]
    Timeout,
    #[error("{}", .0.reason())]
    Declined(StatusCode),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

/// Coarse state derived from a record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Queued or transferring.
    Running,
    Stopped,
    Completed,
    Failed,
}

/// Fields every queue record exposes.
pub trait JobRecord: Clone + Send + Sync + 'static {
    fn key(&self) -> JobKey;
    fn failure(&self) -> Option<&JobFailure>;
    fn running(&self) -> bool;
    fn rate(&self) -> u16;

    fn status(&self) -> JobStatus {
        if self.failure().is_some() {
            JobStatus::Failed
        } else if self.rate() >= 1000 {
            JobStatus::Completed
        } else if self.running() {
            JobStatus::Running
        } else {
            JobStatus::Stopped
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self.status(), JobStatus::Completed | JobStatus::Failed)
    }
}

/// One share link to download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadJob {
    pub name: String,
    pub url: String,
    pub password: String,
    /// Directory the file (or folder) is written into.
    pub dest: PathBuf,
    pub failure: Option<JobFailure>,
    pub running: bool,
    /// Per-mille progress, 0..=1000.
    pub rate: u16,
}

impl DownloadJob {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        password: impl Into<String>,
        dest: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            password: password.into(),
            dest: dest.into(),
            failure: None,
            running: false,
            rate: 0,
        }
    }

    pub fn with_running(&self, running: bool) -> Self {
        Self {
            running,
            ..self.clone()
        }
    }

    pub fn with_rate(&self, rate: u16) -> Self {
        Self {
            rate,
            ..self.clone()
        }
    }

    pub fn with_failure(&self, failure: JobFailure) -> Self {
        Self {
            failure: Some(failure),
            running: false,
            ..self.clone()
        }
    }

    /// Fresh copy for a new attempt: running, no progress, no failure.
    pub fn requeued(&self) -> Self {
        Self {
            failure: None,
            running: true,
            rate: 0,
            ..self.clone()
        }
    }
}

impl JobRecord for DownloadJob {
    fn key(&self) -> JobKey {
        self.url.clone()
    }

    fn failure(&self) -> Option<&JobFailure> {
        self.failure.as_ref()
    }

    fn running(&self) -> bool {
        self.running
    }

    fn rate(&self) -> u16 {
        self.rate
    }
}

/// One local file or directory to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadJob {
    pub path: PathBuf,
    pub folder_id: FileId,
    pub failure: Option<JobFailure>,
    pub running: bool,
    pub rate: u16,
    /// Password applied to the uploaded file once the upload succeeds.
    pub password: Option<String>,
    /// Description applied to the uploaded file once the upload succeeds.
    pub description: Option<String>,
}

impl UploadJob {
    pub fn new(path: impl Into<PathBuf>, folder_id: FileId) -> Self {
        Self {
            path: path.into(),
            folder_id,
            failure: None,
            running: false,
            rate: 0,
            password: None,
            description: None,
        }
    }

    pub fn with_password(self, password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            ..self
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_running(&self, running: bool) -> Self {
        Self {
            running,
            ..self.clone()
        }
    }

    pub fn with_rate(&self, rate: u16) -> Self {
        Self {
            rate,
            ..self.clone()
        }
    }

    pub fn with_failure(&self, failure: JobFailure) -> Self {
        Self {
            failure: Some(failure),
            running: false,
            ..self.clone()
        }
    }

    pub fn requeued(&self) -> Self {
        Self {
            failure: None,
            running: true,
            rate: 0,
            ..self.clone()
        }
    }
}

impl JobRecord for UploadJob {
    fn key(&self) -> JobKey {
        self.path.to_string_lossy().into_owned()
    }

    fn failure(&self) -> Option<&JobFailure> {
        self.failure.as_ref()
    }

    fn running(&self) -> bool {
        self.running
    }

    fn rate(&self) -> u16 {
        self.rate
    }
}
