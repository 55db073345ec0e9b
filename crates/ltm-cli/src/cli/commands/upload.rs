//! `ltm upload <path>...` – sequential uploads into a drive folder.

use anyhow::{bail, Result};
use ltm_core::backend::FileId;
use ltm_core::jobs::{JobRecord, JobStatus, UploadJob};
use ltm_core::scheduler::UploadQueue;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;

use super::{follow, Session};
use crate::cli::render::summary;

pub async fn run_upload(
    session: &Session,
    paths: Vec<PathBuf>,
    folder: FileId,
    password: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let queue = UploadQueue::new(
        Arc::clone(&session.drive),
        session.events.clone(),
        Handle::current(),
    );
    let jobs = paths.into_iter().map(|path| {
        let mut job = UploadJob::new(path, folder);
        if let Some(p) = &password {
            job = job.with_password(p.clone());
        }
        if let Some(d) = &description {
            job = job.with_description(d.clone());
        }
        job
    });

    let mut rx = session.events.subscribe();
    queue.add_many(jobs);
    follow(&mut rx, || queue.is_idle()).await;

    let snapshot = queue.snapshot();
    let failed = snapshot
        .values()
        .inspect(|job| println!("{}", summary(*job)))
        .filter(|job| job.status() == JobStatus::Failed)
        .count();
    if failed > 0 {
        bail!("{failed} of {} upload(s) failed", snapshot.len());
    }
    Ok(())
}
