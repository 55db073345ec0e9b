//! Directory-backed drive.
//!
//! `MirrorDrive` serves a local directory tree (typically a mounted share)
//! through the drive traits. Ids are stable 63-bit hashes of the path
//! relative to the drive root, share URLs embed the id in hex, and the
//! per-item passwords, descriptions and recycle-bin index live in
//! `.ltm/meta.json` beside the served tree.

mod catalog;
mod meta;
mod recycle;
mod transfer;

use anyhow::Context;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use self::meta::MetaStore;
use super::{BackendResult, FileId, StatusCode, ROOT_FOLDER};
use crate::url_model::share_token;

/// Name of the drive's state directory under the root. Never listed.
const STATE_DIR: &str = ".ltm";
const RECYCLE_DIR: &str = "recycle";
const META_FILE: &str = "meta.json";
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A drive whose storage is a local directory.
#[derive(Debug)]
pub struct MirrorDrive {
    root: PathBuf,
    host: String,
    chunk_size: usize,
    /// Serializes read-modify-write of `meta.json` and the moves it indexes.
    meta_lock: Mutex<()>,
}

/// A file or folder inside the served tree.
#[derive(Debug, Clone)]
pub(super) struct Node {
    /// Path relative to the root with `/` separators; empty for the root.
    rel: String,
    abs: PathBuf,
    is_file: bool,
}

impl Node {
    fn id(&self) -> FileId {
        id_of(&self.rel)
    }

    fn name(&self) -> String {
        self.rel.rsplit('/').next().unwrap_or_default().to_string()
    }
}

/// Stable id for a relative path. The root is always `ROOT_FOLDER`.
pub fn id_of(rel: &str) -> FileId {
    if rel.is_empty() {
        return ROOT_FOLDER;
    }
    let digest = Sha256::digest(rel.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) >> 1) as FileId
}

fn join_rel(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Hex token used in share URLs and recycle-bin entry names.
fn token_of(id: FileId) -> String {
    format!("{:016x}", id as u64)
}

/// Rejects names that would escape the parent or collide with drive state.
fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name != STATE_DIR
        && !name.contains(['/', '\\', '\0'])
}

impl MirrorDrive {
    /// Opens (and if needed initializes) a drive rooted at `root`.
    ///
    /// `host` only appears in the share URLs handed out by the drive.
    pub fn open(root: impl Into<PathBuf>, host: impl Into<String>) -> anyhow::Result<Self> {
        let root = root.into();
        let recycle = root.join(STATE_DIR).join(RECYCLE_DIR);
        fs::create_dir_all(&recycle)
            .with_context(|| format!("failed to create drive state dir {}", recycle.display()))?;
        Ok(Self {
            root,
            host: host.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            meta_lock: Mutex::new(()),
        })
    }

    /// Size of each copy chunk; progress is reported once per chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Share URL for an item at a relative path.
    pub fn share_url(&self, rel: &str, is_file: bool) -> String {
        let prefix = if is_file { 'i' } else { 'b' };
        format!("https://{}/{}{}", self.host, prefix, token_of(id_of(rel)))
    }

    fn meta_path(&self) -> PathBuf {
        self.root.join(STATE_DIR).join(META_FILE)
    }

    fn recycle_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR).join(RECYCLE_DIR)
    }

    fn root_node(&self) -> Node {
        Node {
            rel: String::new(),
            abs: self.root.clone(),
            is_file: false,
        }
    }

    fn read_meta(&self) -> BackendResult<MetaStore> {
        let _held = self.meta_lock.lock().unwrap_or_else(|p| p.into_inner());
        Ok(MetaStore::load(&self.meta_path())?)
    }

    /// Runs `f` on the loaded store and saves it, holding the meta lock throughout.
    fn update_meta<R>(
        &self,
        f: impl FnOnce(&mut MetaStore) -> BackendResult<R>,
    ) -> BackendResult<R> {
        let _held = self.meta_lock.lock().unwrap_or_else(|p| p.into_inner());
        let path = self.meta_path();
        let mut store = MetaStore::load(&path)?;
        let out = f(&mut store)?;
        store.save(&path)?;
        Ok(out)
    }

    /// Direct children of a folder, sorted by name. The state dir is skipped.
    fn children(&self, dir: &Node) -> BackendResult<Vec<Node>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&dir.abs)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if dir.rel.is_empty() && name == STATE_DIR {
                continue;
            }
            let file_type = entry.file_type()?;
            if !file_type.is_file() && !file_type.is_dir() {
                continue;
            }
            out.push(Node {
                rel: join_rel(&dir.rel, &name),
                abs: entry.path(),
                is_file: file_type.is_file(),
            });
        }
        out.sort_by(|a, b| a.rel.cmp(&b.rel));
        Ok(out)
    }

    /// Every folder below the root, depth first.
    fn all_folders(&self) -> BackendResult<Vec<Node>> {
        let mut out = Vec::new();
        let mut stack = vec![self.root_node()];
        while let Some(dir) = stack.pop() {
            for child in self.children(&dir)?.into_iter().rev() {
                if !child.is_file {
                    stack.push(child.clone());
                    out.push(child);
                }
            }
        }
        out.sort_by(|a, b| a.rel.cmp(&b.rel));
        Ok(out)
    }

    /// Finds the item with `id`, walking the tree.
    fn locate(&self, id: FileId) -> BackendResult<Option<Node>> {
        if id == ROOT_FOLDER {
            return Ok(Some(self.root_node()));
        }
        let mut stack = vec![self.root_node()];
        while let Some(dir) = stack.pop() {
            for child in self.children(&dir)? {
                if child.id() == id {
                    return Ok(Some(child));
                }
                if !child.is_file {
                    stack.push(child);
                }
            }
        }
        Ok(None)
    }

    /// Finds an item of the given kind, or the status code to decline with.
    fn locate_kind(&self, id: FileId, is_file: bool) -> BackendResult<Result<Node, StatusCode>> {
        Ok(match self.locate(id)? {
            Some(node) if node.is_file == is_file => Ok(node),
            _ => Err(StatusCode::IdError),
        })
    }

    /// Resolves a share URL of the expected kind.
    ///
    /// Malformed or wrong-kind links decline with `UrlInvalid`; links whose
    /// item no longer exists decline with `FileCancelled`.
    fn resolve_share(&self, url: &str, is_file: bool) -> BackendResult<Result<Node, StatusCode>> {
        let prefix = if is_file { 'i' } else { 'b' };
        let id = share_token(url)
            .as_deref()
            .and_then(|token| token.strip_prefix(prefix))
            .and_then(|hex| u64::from_str_radix(hex, 16).ok())
            .map(|raw| raw as FileId);
        let Some(id) = id else {
            return Ok(Err(StatusCode::UrlInvalid));
        };
        Ok(match self.locate(id)? {
            Some(node) if node.is_file == is_file => Ok(node),
            Some(_) => Err(StatusCode::UrlInvalid),
            None => Err(StatusCode::FileCancelled),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_and_non_negative() {
        let a = id_of("docs/report.pdf");
        assert_eq!(a, id_of("docs/report.pdf"));
        assert!(a >= 0);
        assert_ne!(a, id_of("docs/report2.pdf"));
        assert_eq!(id_of(""), ROOT_FOLDER);
    }

    #[test]
    fn share_urls_classify_by_kind() {
        use crate::url_model::ResourceKind;
        let dir = tempfile::tempdir().unwrap();
        let drive = MirrorDrive::open(dir.path(), "drive.test").unwrap();
        assert_eq!(
            ResourceKind::classify(&drive.share_url("a.txt", true)),
            ResourceKind::File
        );
        assert_eq!(
            ResourceKind::classify(&drive.share_url("docs", false)),
            ResourceKind::Folder
        );
    }

    #[test]
    fn state_dir_is_hidden_and_names_validated() {
        let dir = tempfile::tempdir().unwrap();
        let drive = MirrorDrive::open(dir.path(), "drive.test").unwrap();
        fs::write(dir.path().join("a.txt"), b"x").unwrap();
        let names: Vec<String> = drive
            .children(&drive.root_node())
            .unwrap()
            .iter()
            .map(Node::name)
            .collect();
        assert_eq!(names, vec!["a.txt".to_string()]);

        assert!(valid_name("photos"));
        assert!(!valid_name(".ltm"));
        assert!(!valid_name("a/b"));
        assert!(!valid_name(".."));
        assert!(!valid_name(""));
    }

    #[test]
    fn resolve_share_declines_bad_links() {
        let dir = tempfile::tempdir().unwrap();
        let drive = MirrorDrive::open(dir.path(), "drive.test").unwrap();
        fs::write(dir.path().join("a.txt"), b"x").unwrap();

        let file_url = drive.share_url("a.txt", true);
        assert!(drive.resolve_share(&file_url, true).unwrap().is_ok());
        assert_eq!(
            drive.resolve_share(&file_url, false).unwrap().unwrap_err(),
            StatusCode::UrlInvalid
        );
        let gone = drive.share_url("missing.txt", true);
        assert_eq!(
            drive.resolve_share(&gone, true).unwrap().unwrap_err(),
            StatusCode::FileCancelled
        );
    }
}
