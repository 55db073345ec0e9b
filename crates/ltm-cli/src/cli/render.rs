//! Terminal rendering of engine events.

use ltm_core::events::{Event, Listing, NoticeLevel, SharedItem};
use ltm_core::jobs::{JobRecord, JobStatus};
use ltm_core::update::UpdateCheck;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

/// Text for one event, or `None` for events the terminal does not show
/// (queue snapshots, empty notices).
pub fn render(event: &Event) -> Option<String> {
    match event {
        Event::Notice(n) if n.text.is_empty() => None,
        Event::Notice(n) => Some(match n.level {
            NoticeLevel::Info => n.text.clone(),
            NoticeLevel::Success => format!("ok: {}", n.text),
            NoticeLevel::Warning => format!("warning: {}", n.text),
            NoticeLevel::Error => format!("error: {}", n.text),
        }),
        Event::Progress { line, .. } => Some(line.clone()),
        Event::Status(line) => Some(format!("[{line}]")),
        Event::ItemFailed { item, code, .. } => {
            Some(format!("warning: {item} failed: {}", code.reason()))
        }
        Event::Listing(listing) => Some(render_listing(listing)),
        Event::SharedInfo(SharedItem::File(info)) => Some(format!(
            "{}  {} bytes\n  {}\n  {}",
            info.name, info.size, info.url, info.description
        )),
        Event::SharedInfo(SharedItem::Folder(folder)) => {
            let mut out = format!("{}/  {}", folder.info.name, folder.info.url);
            for f in &folder.files {
                out.push_str(&format!("\n  {:<32} {:>10}  {}", f.name, f.size, f.url));
            }
            Some(out)
        }
        Event::MoreInfo(e) | Event::ShareLink(e) => {
            let mut out = format!("{}\n  url: {}", e.name, e.url);
            if !e.password.is_empty() {
                out.push_str(&format!("\n  password: {}", e.password));
            }
            if !e.description.is_empty() {
                out.push_str(&format!("\n  description: {}", e.description));
            }
            Some(out)
        }
        Event::Deleted => Some("delete finished".into()),
        Event::Moved { files, folders } => {
            Some(format!("moved {} item(s)", files.len() + folders.len()))
        }
        Event::DirectLink(Ok(url)) => Some(url.clone()),
        Event::DirectLink(Err(code)) => Some(format!("error: no direct link: {}", code.reason())),
        Event::MoveTargets(targets) => Some(
            targets
                .iter()
                .map(|t| format!("{:>20}  {}", t.id, t.name))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Event::RecycleListing { folders, files } => {
            let mut lines = Vec::new();
            for f in folders {
                lines.push(format!("{:>20}  {}/ ({} files)", f.id, f.name, f.files.len()));
            }
            for f in files {
                lines.push(format!("{:>20}  {}  {} bytes", f.id, f.name, f.size));
            }
            if lines.is_empty() {
                lines.push("recycle bin is empty".into());
            }
            Some(lines.join("\n"))
        }
        Event::RecycleFolder { files, .. } => Some(
            files
                .iter()
                .map(|f| format!("{:>20}  {}  {} bytes", f.id, f.name, f.size))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Event::UpdateCheck(UpdateCheck::Available { tag, notes }) => {
            Some(format!("new version {tag} available\n{notes}"))
        }
        Event::UpdateCheck(UpdateCheck::UpToDate) => Some("already up to date".into()),
        Event::UpdateCheck(UpdateCheck::Failed(why)) => Some(format!("error: update check failed: {why}")),
        _ => None,
    }
}

fn render_listing(listing: &Listing) -> String {
    let mut lines = Vec::new();
    if let Some(path) = &listing.path {
        let names: Vec<_> = path.iter().map(|c| c.name.as_str()).collect();
        lines.push(names.join(" > "));
    }
    for f in listing.folders.iter().flatten() {
        let lock = if f.has_password { "*" } else { " " };
        lines.push(format!("{:>20} {lock} {}/", f.id, f.name));
    }
    for f in listing.files.iter().flatten() {
        let lock = if f.has_password { "*" } else { " " };
        lines.push(format!(
            "{:>20} {lock} {:<32} {:>10}  {} downloads",
            f.id, f.name, f.size, f.downloads
        ));
    }
    lines.join("\n")
}

/// Prints everything already queued on `rx`.
pub fn print_pending(rx: &mut Receiver<Event>) {
    loop {
        match rx.try_recv() {
            Ok(event) => print_event(&event),
            Err(TryRecvError::Lagged(n)) => tracing::debug!(missed = n, "event printer lagged"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

pub fn print_event(event: &Event) {
    if let Some(text) = render(event) {
        println!("{text}");
    }
}

/// One-line summary of a finished queue record.
pub fn summary<J: JobRecord>(record: &J) -> String {
    match (record.status(), record.failure()) {
        (JobStatus::Failed, Some(f)) => format!("failed     {}  ({f})", record.key()),
        (status, _) => format!("{:<10} {}", format!("{status:?}").to_lowercase(), record.key()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltm_core::backend::{FileEntry, FolderEntry, PathCrumb, StatusCode};
    use ltm_core::events::Notice;
    use ltm_core::jobs::{DownloadJob, JobFailure};

    #[test]
    fn notices_are_prefixed_by_level() {
        let ev = Event::Notice(Notice::error("boom", 0));
        assert_eq!(render(&ev).unwrap(), "error: boom");
        assert!(render(&Event::Notice(Notice::info("", 0))).is_none());
    }

    #[test]
    fn listing_shows_path_folders_then_files() {
        let listing = Listing {
            folder: -1,
            files: Some(vec![FileEntry {
                id: 7,
                name: "a.txt".into(),
                size: 3,
                modified: 0,
                downloads: 2,
                has_password: true,
                has_description: false,
            }]),
            folders: Some(vec![FolderEntry {
                id: 8,
                name: "docs".into(),
                description: String::new(),
                has_password: false,
            }]),
            path: Some(vec![PathCrumb {
                name: "/".into(),
                id: -1,
            }]),
        };
        let text = render(&Event::Listing(listing)).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "/");
        assert!(lines[1].ends_with("docs/"));
        assert!(lines[2].contains("* a.txt"));
    }

    #[test]
    fn snapshots_are_not_printed() {
        let ev = Event::Downloads(Default::default());
        assert!(render(&ev).is_none());
    }

    #[test]
    fn failed_summary_carries_reason() {
        let job = DownloadJob::new("a", "https://x.test/iabcdef", "", "/tmp")
            .with_failure(JobFailure::Declined(StatusCode::PasswordError));
        let line = summary(&job);
        assert!(line.starts_with("failed"));
        assert!(line.contains("https://x.test/iabcdef"));
    }
}
