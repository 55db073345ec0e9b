//! `ltm download <link>...` – run share links through the download pool.

use anyhow::{bail, Result};
use ltm_core::jobs::{DownloadJob, JobRecord, JobStatus};
use ltm_core::scheduler::DownloadDispatcher;
use ltm_core::url_model::{parse_share_text, share_token};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;

use super::{follow, Session};
use crate::cli::render::summary;

/// Builds a job from one argument: a share URL optionally followed by its
/// password. `fallback` is used when the argument carries none.
fn job_from_arg(arg: &str, fallback: Option<&str>, dest: &Path) -> Option<DownloadJob> {
    let (url, found) = parse_share_text(arg)?;
    let password = if found.is_empty() {
        fallback.unwrap_or_default().to_string()
    } else {
        found
    };
    let name = share_token(&url).unwrap_or_else(|| url.clone());
    Some(DownloadJob::new(name, url, password, dest))
}

pub async fn run_download(
    session: &Session,
    links: &[String],
    password: Option<&str>,
    dest: Option<PathBuf>,
    jobs: Option<usize>,
) -> Result<()> {
    let dest = match dest.or_else(|| session.cfg.download_dir.clone()) {
        Some(d) => d,
        None => std::env::current_dir()?,
    };

    let mut batch = Vec::with_capacity(links.len());
    for arg in links {
        match job_from_arg(arg, password, &dest) {
            Some(job) => batch.push(job),
            None => bail!("no share link in {arg:?}"),
        }
    }

    let dispatcher = DownloadDispatcher::new(
        Arc::clone(&session.drive),
        session.events.clone(),
        Handle::current(),
        jobs.unwrap_or(session.cfg.max_concurrent_downloads),
        session.cfg.dispatch_poll(),
    );
    let mut rx = session.events.subscribe();
    dispatcher.add_many(batch);
    follow(&mut rx, || dispatcher.is_idle()).await;

    let snapshot = dispatcher.snapshot();
    let mut failed = 0;
    for job in snapshot.values() {
        println!("{}", summary(job));
        if job.status() == JobStatus::Failed {
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed} of {} download(s) failed", snapshot.len());
    }
    Ok(())
}
