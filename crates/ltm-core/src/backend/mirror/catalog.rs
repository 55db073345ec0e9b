//! Browsing, share lookups and tree edits on the mirror.

use anyhow::anyhow;
use std::fs;
use std::time::UNIX_EPOCH;

use super::meta::{ItemMeta, MetaStore, Recycled};
use super::recycle::remove_path;
use super::{id_of, join_rel, token_of, valid_name, MirrorDrive, Node};
use crate::backend::{
    BackendResult, Catalog, DirectLink, FileEntry, FileId, FolderEntry, FolderListing, Metadata,
    MoveTarget, PathCrumb, ShareInfo, SharedFolder, StatusCode, ROOT_FOLDER,
};

/// Crumb name shown for the drive root.
const ROOT_NAME: &str = "/";

impl MirrorDrive {
    fn file_entry(&self, node: &Node, meta: &MetaStore) -> BackendResult<FileEntry> {
        let stat = fs::metadata(&node.abs)?;
        let modified = stat
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let item = meta.item(&node.rel);
        Ok(FileEntry {
            id: node.id(),
            name: node.name(),
            size: stat.len(),
            modified,
            downloads: item.downloads,
            has_password: !item.password.is_empty(),
            has_description: !item.description.is_empty(),
        })
    }

    fn share_of(&self, node: &Node, meta: &MetaStore) -> BackendResult<ShareInfo> {
        let item = meta.item(&node.rel);
        let size = if node.is_file {
            fs::metadata(&node.abs)?.len()
        } else {
            0
        };
        Ok(ShareInfo {
            code: StatusCode::Success,
            name: node.name(),
            url: self.share_url(&node.rel, node.is_file),
            password: item.password,
            description: item.description,
            size,
            is_file: node.is_file,
        })
    }

    fn folder_node(&self, id: FileId) -> BackendResult<Node> {
        match self.locate_kind(id, false)? {
            Ok(node) => Ok(node),
            Err(_) => Err(anyhow!("no folder with id {id}").into()),
        }
    }

    fn crumbs(rel: &str) -> Vec<PathCrumb> {
        let mut path = vec![PathCrumb {
            name: ROOT_NAME.to_string(),
            id: ROOT_FOLDER,
        }];
        let mut prefix = String::new();
        for part in rel.split('/').filter(|p| !p.is_empty()) {
            prefix = join_rel(&prefix, part);
            path.push(PathCrumb {
                name: part.to_string(),
                id: id_of(&prefix),
            });
        }
        path
    }

    fn move_node(&self, id: FileId, target: FileId, is_file: bool) -> BackendResult<StatusCode> {
        let node = match self.locate_kind(id, is_file)? {
            Ok(node) => node,
            Err(code) => return Ok(code),
        };
        let dir = match self.locate_kind(target, false)? {
            Ok(dir) => dir,
            Err(code) => return Ok(code),
        };
        let nested = format!("{}/", node.rel);
        if !is_file && (dir.rel == node.rel || dir.rel.starts_with(&nested)) {
            return Ok(StatusCode::Failed);
        }
        let name = node.name();
        let dst = dir.abs.join(&name);
        if dst.exists() {
            return Ok(StatusCode::Failed);
        }
        let new_rel = join_rel(&dir.rel, &name);
        self.update_meta(|m| {
            fs::rename(&node.abs, &dst)?;
            m.rekey(&node.rel, &new_rel);
            Ok(StatusCode::Success)
        })
    }

    fn edit_item(
        &self,
        id: FileId,
        is_file: bool,
        edit: impl FnOnce(&mut ItemMeta),
    ) -> BackendResult<StatusCode> {
        let node = match self.locate_kind(id, is_file)? {
            Ok(node) => node,
            Err(code) => return Ok(code),
        };
        self.update_meta(|m| {
            edit(m.item_mut(&node.rel));
            m.prune();
            Ok(StatusCode::Success)
        })
    }
}

impl Metadata for MirrorDrive {
    fn set_password(
        &self,
        id: FileId,
        password: &str,
        is_file: bool,
    ) -> BackendResult<StatusCode> {
        self.edit_item(id, is_file, |item| item.password = password.to_string())
    }

    fn set_description(
        &self,
        id: FileId,
        description: &str,
        is_file: bool,
    ) -> BackendResult<StatusCode> {
        self.edit_item(id, is_file, |item| item.description = description.to_string())
    }
}

impl Catalog for MirrorDrive {
    fn list_files(&self, folder: FileId) -> BackendResult<Vec<FileEntry>> {
        let dir = self.folder_node(folder)?;
        let meta = self.read_meta()?;
        self.children(&dir)?
            .iter()
            .filter(|n| n.is_file)
            .map(|n| self.file_entry(n, &meta))
            .collect()
    }

    fn list_folders(&self, folder: FileId) -> BackendResult<FolderListing> {
        let dir = self.folder_node(folder)?;
        let meta = self.read_meta()?;
        let folders = self
            .children(&dir)?
            .into_iter()
            .filter(|n| !n.is_file)
            .map(|n| {
                let item = meta.item(&n.rel);
                FolderEntry {
                    id: n.id(),
                    name: n.name(),
                    description: item.description,
                    has_password: !item.password.is_empty(),
                }
            })
            .collect();
        Ok(FolderListing {
            folders,
            path: Self::crumbs(&dir.rel),
        })
    }

    fn share_info(&self, id: FileId, is_file: bool) -> BackendResult<ShareInfo> {
        match self.locate_kind(id, is_file)? {
            Ok(node) => self.share_of(&node, &self.read_meta()?),
            Err(code) => Ok(ShareInfo::declined(code)),
        }
    }

    fn share_info_by_url(&self, url: &str, password: &str) -> BackendResult<ShareInfo> {
        let node = match self.resolve_share(url, true)? {
            Ok(node) => node,
            Err(code) => return Ok(ShareInfo::declined(code)),
        };
        let meta = self.read_meta()?;
        if let Some(code) = meta.check_password(&node.rel, password) {
            return Ok(ShareInfo::declined(code));
        }
        self.share_of(&node, &meta)
    }

    fn folder_info_by_url(&self, url: &str, password: &str) -> BackendResult<SharedFolder> {
        let declined = |code| SharedFolder {
            info: ShareInfo {
                is_file: false,
                ..ShareInfo::declined(code)
            },
            files: Vec::new(),
        };
        let folder = match self.resolve_share(url, false)? {
            Ok(node) => node,
            Err(code) => return Ok(declined(code)),
        };
        let meta = self.read_meta()?;
        if let Some(code) = meta.check_password(&folder.rel, password) {
            return Ok(declined(code));
        }
        let files = self
            .children(&folder)?
            .iter()
            .filter(|n| n.is_file)
            .map(|n| self.share_of(n, &meta))
            .collect::<BackendResult<Vec<_>>>()?;
        Ok(SharedFolder {
            info: self.share_of(&folder, &meta)?,
            files,
        })
    }

    fn direct_link(&self, url: &str, password: &str) -> BackendResult<DirectLink> {
        let node = match self.resolve_share(url, true)? {
            Ok(node) => node,
            Err(code) => return Ok(DirectLink { code, url: None }),
        };
        if let Some(code) = self.read_meta()?.check_password(&node.rel, password) {
            return Ok(DirectLink { code, url: None });
        }
        let link = url::Url::from_file_path(&node.abs)
            .map_err(|()| anyhow!("not an absolute path: {}", node.abs.display()))?;
        Ok(DirectLink {
            code: StatusCode::Success,
            url: Some(link.to_string()),
        })
    }

    fn move_targets(&self) -> BackendResult<Vec<MoveTarget>> {
        let mut targets = vec![MoveTarget {
            name: ROOT_NAME.to_string(),
            id: ROOT_FOLDER,
        }];
        targets.extend(self.all_folders()?.into_iter().map(|n| MoveTarget {
            id: n.id(),
            name: n.rel,
        }));
        Ok(targets)
    }

    fn move_file(&self, id: FileId, target: FileId) -> BackendResult<StatusCode> {
        self.move_node(id, target, true)
    }

    fn move_folder(&self, id: FileId, target: FileId) -> BackendResult<StatusCode> {
        self.move_node(id, target, false)
    }

    fn delete(&self, id: FileId, is_file: bool) -> BackendResult<StatusCode> {
        if id == ROOT_FOLDER {
            return Ok(StatusCode::IdError);
        }
        let node = match self.locate_kind(id, is_file)? {
            Ok(node) => node,
            Err(code) => return Ok(code),
        };
        let slot = self.recycle_dir().join(token_of(id));
        self.update_meta(|m| {
            if m.recycled.remove(&id).is_some() {
                remove_path(&slot)?;
            }
            fs::rename(&node.abs, &slot)?;
            m.recycled.insert(
                id,
                Recycled {
                    name: node.name(),
                    origin: node.rel.clone(),
                    is_file,
                },
            );
            Ok(StatusCode::Success)
        })
    }

    fn mkdir(&self, parent: FileId, name: &str, description: &str) -> BackendResult<StatusCode> {
        let name = name.trim();
        if !valid_name(name) {
            return Ok(StatusCode::MkdirError);
        }
        let dir = match self.locate_kind(parent, false)? {
            Ok(dir) => dir,
            Err(code) => return Ok(code),
        };
        let path = dir.abs.join(name);
        if path.exists() {
            return Ok(StatusCode::MkdirError);
        }
        let rel = join_rel(&dir.rel, name);
        self.update_meta(|m| {
            fs::create_dir(&path)?;
            if !description.is_empty() {
                m.item_mut(&rel).description = description.to_string();
            }
            Ok(StatusCode::Success)
        })
    }

    fn set_folder_info(
        &self,
        id: FileId,
        name: &str,
        description: &str,
    ) -> BackendResult<StatusCode> {
        if id == ROOT_FOLDER {
            return Ok(StatusCode::IdError);
        }
        let node = match self.locate_kind(id, false)? {
            Ok(node) => node,
            Err(code) => return Ok(code),
        };
        let name = name.trim();
        if !valid_name(name) {
            return Ok(StatusCode::Failed);
        }
        let parent = node.rel.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
        let new_rel = join_rel(parent, name);
        let new_abs = node.abs.with_file_name(name);
        if new_rel != node.rel && new_abs.exists() {
            return Ok(StatusCode::Failed);
        }
        self.update_meta(|m| {
            if new_rel != node.rel {
                fs::rename(&node.abs, &new_abs)?;
                m.rekey(&node.rel, &new_rel);
            }
            m.item_mut(&new_rel).description = description.to_string();
            m.prune();
            Ok(StatusCode::Success)
        })
    }
}
