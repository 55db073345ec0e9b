//! Recycle bin of the mirror (`.ltm/recycle/`).

use anyhow::anyhow;
use std::fs;
use std::path::Path;
use tracing::warn;

use super::meta::MetaStore;
use super::{id_of, token_of, MirrorDrive, RECYCLE_DIR, STATE_DIR};
use crate::backend::{
    BackendResult, FileId, RecycleBin, RecycledFile, RecycledFolder, StatusCode, ROOT_FOLDER,
};

/// Removes a file or a whole directory tree.
pub(super) fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[derive(Clone, Copy)]
enum BinOp {
    Recover,
    Purge,
}

impl MirrorDrive {
    /// Files directly inside a recycled folder.
    fn recycled_dir_files(&self, id: FileId) -> BackendResult<Vec<RecycledFile>> {
        let token = token_of(id);
        let dir = self.recycle_dir().join(&token);
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let stat = entry.metadata()?;
            if !stat.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(RecycledFile {
                id: id_of(&format!("{STATE_DIR}/{RECYCLE_DIR}/{token}/{name}")),
                name,
                size: stat.len(),
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Recovers or purges one entry; returns the code to report for it.
    fn apply_one(
        &self,
        store: &mut MetaStore,
        id: FileId,
        is_file: bool,
        op: BinOp,
    ) -> StatusCode {
        let entry = store.recycled.get(&id).filter(|e| e.is_file == is_file);
        let Some(entry) = entry.cloned() else {
            return StatusCode::IdError;
        };
        let slot = self.recycle_dir().join(token_of(id));
        let result = match op {
            BinOp::Purge => remove_path(&slot),
            BinOp::Recover => {
                let dst = self.root.join(&entry.origin);
                if dst.exists() {
                    return StatusCode::Failed;
                }
                dst.parent()
                    .map(fs::create_dir_all)
                    .unwrap_or(Ok(()))
                    .and_then(|()| fs::rename(&slot, &dst))
            }
        };
        match result {
            Ok(()) => {
                store.recycled.remove(&id);
                StatusCode::Success
            }
            Err(e) => {
                warn!(item = %entry.name, error = %e, "recycle bin operation failed");
                StatusCode::Failed
            }
        }
    }

    /// Applies `op` to every listed entry; the last failure wins.
    fn apply_all(
        &self,
        files: &[FileId],
        folders: &[FileId],
        op: BinOp,
    ) -> BackendResult<StatusCode> {
        self.update_meta(|store| {
            let mut code = StatusCode::Success;
            let targets = files
                .iter()
                .map(|id| (*id, true))
                .chain(folders.iter().map(|id| (*id, false)));
            for (id, is_file) in targets {
                let one = self.apply_one(store, id, is_file, op);
                if !one.is_success() {
                    code = one;
                }
            }
            Ok(code)
        })
    }

    fn everything(&self) -> BackendResult<(Vec<FileId>, Vec<FileId>)> {
        let store = self.read_meta()?;
        let (files, folders): (Vec<_>, Vec<_>) =
            store.recycled.iter().partition(|(_, entry)| entry.is_file);
        Ok((
            files.into_iter().map(|(id, _)| *id).collect(),
            folders.into_iter().map(|(id, _)| *id).collect(),
        ))
    }
}

impl RecycleBin for MirrorDrive {
    fn recycled_folders(&self) -> BackendResult<Vec<RecycledFolder>> {
        let store = self.read_meta()?;
        store
            .recycled
            .iter()
            .filter(|(_, entry)| !entry.is_file)
            .map(|(id, entry)| {
                Ok(RecycledFolder {
                    id: *id,
                    name: entry.name.clone(),
                    files: self.recycled_dir_files(*id)?,
                })
            })
            .collect()
    }

    fn recycled_files(&self, folder: FileId) -> BackendResult<Vec<RecycledFile>> {
        let store = self.read_meta()?;
        if folder != ROOT_FOLDER {
            return match store.recycled.get(&folder) {
                Some(entry) if !entry.is_file => self.recycled_dir_files(folder),
                _ => Err(anyhow!("no recycled folder with id {folder}").into()),
            };
        }
        let mut files = Vec::new();
        for (id, entry) in store.recycled.iter().filter(|(_, e)| e.is_file) {
            let size = fs::metadata(self.recycle_dir().join(token_of(*id)))
                .map(|m| m.len())
                .unwrap_or(0);
            files.push(RecycledFile {
                id: *id,
                name: entry.name.clone(),
                size,
            });
        }
        Ok(files)
    }

    fn recover(&self, files: &[FileId], folders: &[FileId]) -> BackendResult<StatusCode> {
        self.apply_all(files, folders, BinOp::Recover)
    }

    fn purge(&self, files: &[FileId], folders: &[FileId]) -> BackendResult<StatusCode> {
        self.apply_all(files, folders, BinOp::Purge)
    }

    fn clear(&self) -> BackendResult<StatusCode> {
        let (files, folders) = self.everything()?;
        self.apply_all(&files, &folders, BinOp::Purge)
    }

    fn recover_all(&self) -> BackendResult<StatusCode> {
        let (files, folders) = self.everything()?;
        self.apply_all(&files, &folders, BinOp::Recover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Catalog;

    fn drive() -> (tempfile::TempDir, MirrorDrive) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("album")).unwrap();
        fs::write(dir.path().join("album/p1.jpg"), b"jpeg").unwrap();
        fs::write(dir.path().join("note.txt"), b"note").unwrap();
        let drive = MirrorDrive::open(dir.path(), "drive.test").unwrap();
        drive.delete(id_of("album"), false).unwrap();
        drive.delete(id_of("note.txt"), true).unwrap();
        (dir, drive)
    }

    #[test]
    fn listing_shows_folders_and_loose_files() {
        let (_root, drive) = drive();
        let folders = drive.recycled_folders().unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "album");
        assert_eq!(folders[0].files[0].name, "p1.jpg");

        let loose = drive.recycled_files(ROOT_FOLDER).unwrap();
        assert_eq!(loose.len(), 1);
        assert_eq!(loose[0].size, 4);

        let inside = drive.recycled_files(id_of("album")).unwrap();
        assert_eq!(inside.len(), 1);
    }

    #[test]
    fn recover_restores_origin() {
        let (root, drive) = drive();
        let code = drive.recover(&[id_of("note.txt")], &[]).unwrap();
        assert_eq!(code, StatusCode::Success);
        assert!(root.path().join("note.txt").exists());
        assert_eq!(drive.recycled_files(ROOT_FOLDER).unwrap().len(), 0);

        let code = drive.recover(&[id_of("note.txt")], &[]).unwrap();
        assert_eq!(code, StatusCode::IdError);
    }

    #[test]
    fn purge_and_clear() {
        let (root, drive) = drive();
        assert_eq!(
            drive.purge(&[], &[id_of("album")]).unwrap(),
            StatusCode::Success
        );
        assert!(drive.recycled_folders().unwrap().is_empty());
        assert_eq!(drive.clear().unwrap(), StatusCode::Success);
        assert!(drive.recycled_files(ROOT_FOLDER).unwrap().is_empty());
        assert!(!root.path().join("note.txt").exists());
    }

    #[test]
    fn recover_all_restores_everything() {
        let (root, drive) = drive();
        assert_eq!(drive.recover_all().unwrap(), StatusCode::Success);
        assert!(root.path().join("album/p1.jpg").exists());
        assert!(root.path().join("note.txt").exists());
    }
}
