//! Chunked copies in and out of the mirror.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use super::{id_of, join_rel, valid_name, MirrorDrive, Node};
use crate::backend::{
    BackendError, BackendResult, FileId, StatusCode, TransferObserver, Transfers, Uploaded,
};

/// Reports a multi-file transfer as one job: samples are summed over the
/// files already finished and carry the folder's name and total size.
struct FolderProgress<'a> {
    outer: &'a dyn TransferObserver,
    name: String,
    total: u64,
    finished: AtomicU64,
}

impl<'a> FolderProgress<'a> {
    fn new(outer: &'a dyn TransferObserver, name: String, total: u64) -> Self {
        Self {
            outer,
            name,
            total,
            finished: AtomicU64::new(0),
        }
    }

    /// Counts a file as done, whether it was copied or failed.
    fn file_done(&self, size: u64) {
        let finished = self.finished.fetch_add(size, Ordering::SeqCst) + size;
        self.outer.on_progress(&self.name, self.total, finished);
    }
}

impl TransferObserver for FolderProgress<'_> {
    fn on_progress(&self, _name: &str, _total: u64, done: u64) {
        let finished = self.finished.load(Ordering::SeqCst);
        self.outer
            .on_progress(&self.name, self.total, (finished + done).min(self.total));
    }

    fn on_item_failed(&self, code: StatusCode, item: &str) {
        self.outer.on_item_failed(code, item);
    }

    fn should_stop(&self) -> bool {
        self.outer.should_stop()
    }
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Total size of the regular files under `dir`.
fn tree_len(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|e| match e.file_type() {
            Ok(t) if t.is_dir() => tree_len(&e.path()),
            Ok(t) if t.is_file() => file_len(&e.path()),
            _ => 0,
        })
        .sum()
}

impl MirrorDrive {
    /// Copies `src` to `dst` chunk by chunk, reporting progress under `name`.
    ///
    /// A stop request between chunks, or any error, removes the partial `dst`.
    fn copy_chunked(
        &self,
        src: &Path,
        dst: &Path,
        name: &str,
        observer: &dyn TransferObserver,
    ) -> BackendResult<u64> {
        let total = fs::metadata(src)?.len();
        let mut reader = File::open(src)?;
        let mut writer = File::create(dst)?;
        let result = self.pump(&mut reader, &mut writer, total, name, observer);
        if result.is_err() {
            drop(writer);
            if let Err(e) = fs::remove_file(dst) {
                warn!(path = %dst.display(), error = %e, "failed to remove partial file");
            }
        }
        result
    }

    fn pump(
        &self,
        reader: &mut File,
        writer: &mut File,
        total: u64,
        name: &str,
        observer: &dyn TransferObserver,
    ) -> BackendResult<u64> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut done = 0u64;
        observer.on_progress(name, total, 0);
        loop {
            if done < total && observer.should_stop() {
                return Err(BackendError::Stopped);
            }
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            writer.write_all(&buf[..n])?;
            done += n as u64;
            observer.on_progress(name, total, done);
        }
        writer.flush()?;
        Ok(done)
    }

    /// Uploads a local tree into `dst`, reporting per-file failures.
    fn upload_tree(&self, src: &Path, dst: &Path, progress: &FolderProgress) -> BackendResult<()> {
        fs::create_dir_all(dst)?;
        let mut entries = fs::read_dir(src)?.collect::<Result<Vec<_>, std::io::Error>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            let is_dir = entry.file_type()?.is_dir();
            let result = if is_dir {
                self.upload_tree(&path, &dst.join(&name), progress)
            } else {
                self.copy_chunked(&path, &dst.join(&name), &name, progress).map(|_| ())
            };
            match result {
                Err(BackendError::Stopped) => return Err(BackendError::Stopped),
                Err(e) => {
                    warn!(item = %name, error = %e, "upload item failed");
                    progress.on_item_failed(StatusCode::Failed, &name);
                }
                Ok(()) => {}
            }
            if !is_dir {
                progress.file_done(file_len(&path));
            }
        }
        Ok(())
    }

    fn upload_target(
        &self,
        folder: FileId,
        path: &Path,
    ) -> BackendResult<Result<(Node, String), StatusCode>> {
        let dir = match self.locate_kind(folder, false)? {
            Ok(dir) => dir,
            Err(code) => return Ok(Err(code)),
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| valid_name(n))
            .map(str::to_string);
        Ok(match name {
            Some(name) => Ok((dir, name)),
            None => Err(StatusCode::PathError),
        })
    }

    fn bump_downloads(&self, rel: &str) -> BackendResult<()> {
        self.update_meta(|m| {
            m.item_mut(rel).downloads += 1;
            Ok(())
        })
    }
}

impl Transfers for MirrorDrive {
    fn download_file(
        &self,
        url: &str,
        password: &str,
        dest: &Path,
        observer: &dyn TransferObserver,
    ) -> BackendResult<StatusCode> {
        let node = match self.resolve_share(url, true)? {
            Ok(node) => node,
            Err(code) => return Ok(code),
        };
        if let Some(code) = self.read_meta()?.check_password(&node.rel, password) {
            return Ok(code);
        }
        fs::create_dir_all(dest)?;
        let name = node.name();
        self.copy_chunked(&node.abs, &dest.join(&name), &name, observer)?;
        self.bump_downloads(&node.rel)?;
        Ok(StatusCode::Success)
    }

    fn download_folder(
        &self,
        url: &str,
        password: &str,
        dest: &Path,
        observer: &dyn TransferObserver,
    ) -> BackendResult<StatusCode> {
        let folder = match self.resolve_share(url, false)? {
            Ok(node) => node,
            Err(code) => return Ok(code),
        };
        if let Some(code) = self.read_meta()?.check_password(&folder.rel, password) {
            return Ok(code);
        }
        let target = dest.join(folder.name());
        fs::create_dir_all(&target)?;
        let files: Vec<Node> = self
            .children(&folder)?
            .into_iter()
            .filter(|n| n.is_file)
            .collect();
        let total = files.iter().map(|f| file_len(&f.abs)).sum();
        let progress = FolderProgress::new(observer, folder.name(), total);
        for file in files {
            let name = file.name();
            let size = file_len(&file.abs);
            match self.copy_chunked(&file.abs, &target.join(&name), &name, &progress) {
                Ok(_) => self.bump_downloads(&file.rel)?,
                Err(BackendError::Stopped) => return Err(BackendError::Stopped),
                Err(e) => {
                    warn!(item = %name, error = %e, "folder item failed");
                    progress.on_item_failed(StatusCode::Failed, &name);
                }
            }
            progress.file_done(size);
        }
        Ok(StatusCode::Success)
    }

    fn upload_file(
        &self,
        path: &Path,
        folder: FileId,
        observer: &dyn TransferObserver,
    ) -> BackendResult<Uploaded> {
        let (dir, name) = match self.upload_target(folder, path)? {
            Ok(target) => target,
            Err(status) => {
                return Ok(Uploaded {
                    status,
                    id: 0,
                    is_file: true,
                })
            }
        };
        self.copy_chunked(path, &dir.abs.join(&name), &name, observer)?;
        Ok(Uploaded {
            status: StatusCode::Success,
            id: id_of(&join_rel(&dir.rel, &name)),
            is_file: true,
        })
    }

    fn upload_folder(
        &self,
        path: &Path,
        folder: FileId,
        observer: &dyn TransferObserver,
    ) -> BackendResult<StatusCode> {
        let (dir, name) = match self.upload_target(folder, path)? {
            Ok(target) => target,
            Err(code) => return Ok(code),
        };
        let progress = FolderProgress::new(observer, name.clone(), tree_len(path));
        self.upload_tree(path, &dir.abs.join(name), &progress)?;
        Ok(StatusCode::Success)
    }
}
