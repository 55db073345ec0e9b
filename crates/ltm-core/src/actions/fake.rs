//! Scripted drive for action unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast::Receiver;

use crate::backend::{
    Account, BackendError, BackendResult, Catalog, DirectLink, FileEntry, FileId, FolderEntry,
    FolderListing, Metadata, MoveTarget, PathCrumb, RecycleBin, RecycledFile, RecycledFolder,
    ShareInfo, SharedFolder, StatusCode, ROOT_FOLDER,
};
use crate::events::{Event, Notice};

/// Scripted reply for one id (or for everything via `default`).
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Code(StatusCode),
    Timeout,
    /// An unstructured backend fault.
    Fault,
}

pub struct FakeDrive {
    pub default: Mutex<Reply>,
    pub per_id: Mutex<HashMap<FileId, Reply>>,
    pub calls: Mutex<Vec<String>>,
    pub files: Vec<FileEntry>,
    pub folders: Vec<FolderEntry>,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self {
            default: Mutex::new(Reply::Code(StatusCode::Success)),
            per_id: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            files: vec![file(2, "b.txt"), file(1, "a.txt")],
            folders: vec![folder(11, "zeta"), folder(10, "alpha")],
        }
    }

    pub fn replying(reply: Reply) -> Self {
        let drive = Self::new();
        *drive.default.lock().unwrap() = reply;
        drive
    }

    pub fn script(&self, id: FileId, reply: Reply) {
        self.per_id.lock().unwrap().insert(id, reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn reply(&self, id: Option<FileId>) -> BackendResult<StatusCode> {
        let scripted = id.and_then(|id| self.per_id.lock().unwrap().get(&id).copied());
        match scripted.unwrap_or(*self.default.lock().unwrap()) {
            Reply::Code(code) => Ok(code),
            Reply::Timeout => Err(BackendError::Timeout),
            Reply::Fault => Err(BackendError::Other(anyhow::anyhow!("disk unavailable"))),
        }
    }

    fn info(&self, id: Option<FileId>, is_file: bool) -> BackendResult<ShareInfo> {
        let code = self.reply(id)?;
        if !code.is_success() {
            return Ok(ShareInfo::declined(code));
        }
        let id = id.unwrap_or(0);
        Ok(ShareInfo {
            code,
            name: format!("item{id}"),
            url: format!("https://share.test/i{id:08}"),
            password: "pw".into(),
            description: format!("about {id}"),
            size: 10,
            is_file,
        })
    }
}

fn file(id: FileId, name: &str) -> FileEntry {
    FileEntry {
        id,
        name: name.into(),
        size: 1,
        modified: 0,
        downloads: 0,
        has_password: false,
        has_description: false,
    }
}

fn folder(id: FileId, name: &str) -> FolderEntry {
    FolderEntry {
        id,
        name: name.into(),
        description: String::new(),
        has_password: false,
    }
}

impl Account for FakeDrive {
    fn login(&self, user: &str, _password: &str) -> BackendResult<StatusCode> {
        self.record(format!("login {user}"));
        self.reply(None)
    }

    fn login_by_cookie(&self, cookie: &str) -> BackendResult<StatusCode> {
        self.record(format!("cookie {cookie}"));
        self.reply(None)
    }

    fn cookie(&self) -> Option<String> {
        Some("session=1".into())
    }

    fn logout(&self) -> BackendResult<StatusCode> {
        self.record("logout".into());
        self.reply(None)
    }
}

impl Metadata for FakeDrive {
    fn set_password(&self, id: FileId, password: &str, _is_file: bool) -> BackendResult<StatusCode> {
        self.record(format!("password {id} {password}"));
        self.reply(Some(id))
    }

    fn set_description(
        &self,
        id: FileId,
        description: &str,
        _is_file: bool,
    ) -> BackendResult<StatusCode> {
        self.record(format!("describe {id} {description}"));
        self.reply(Some(id))
    }
}

impl Catalog for FakeDrive {
    fn list_files(&self, folder: FileId) -> BackendResult<Vec<FileEntry>> {
        self.record(format!("files {folder}"));
        self.reply(None)?;
        Ok(self.files.clone())
    }

    fn list_folders(&self, folder: FileId) -> BackendResult<FolderListing> {
        self.record(format!("folders {folder}"));
        self.reply(None)?;
        Ok(FolderListing {
            folders: self.folders.clone(),
            path: vec![PathCrumb {
                name: "/".into(),
                id: ROOT_FOLDER,
            }],
        })
    }

    fn share_info(&self, id: FileId, is_file: bool) -> BackendResult<ShareInfo> {
        self.record(format!("share {id}"));
        self.info(Some(id), is_file)
    }

    fn share_info_by_url(&self, url: &str, password: &str) -> BackendResult<ShareInfo> {
        self.record(format!("share_url {url} {password}"));
        self.info(None, true)
    }

    fn folder_info_by_url(&self, url: &str, password: &str) -> BackendResult<SharedFolder> {
        self.record(format!("folder_url {url} {password}"));
        let info = self.info(None, false)?;
        Ok(SharedFolder {
            info,
            files: Vec::new(),
        })
    }

    fn direct_link(&self, url: &str, _password: &str) -> BackendResult<DirectLink> {
        self.record(format!("direct {url}"));
        let code = self.reply(None)?;
        Ok(DirectLink {
            code,
            url: code.is_success().then(|| "file:///tmp/direct".to_string()),
        })
    }

    fn move_targets(&self) -> BackendResult<Vec<MoveTarget>> {
        self.record("targets".into());
        self.reply(None)?;
        Ok(vec![MoveTarget {
            name: "/".into(),
            id: ROOT_FOLDER,
        }])
    }

    fn move_file(&self, id: FileId, target: FileId) -> BackendResult<StatusCode> {
        self.record(format!("move_file {id} {target}"));
        self.reply(Some(id))
    }

    fn move_folder(&self, id: FileId, target: FileId) -> BackendResult<StatusCode> {
        self.record(format!("move_folder {id} {target}"));
        self.reply(Some(id))
    }

    fn delete(&self, id: FileId, _is_file: bool) -> BackendResult<StatusCode> {
        self.record(format!("delete {id}"));
        self.reply(Some(id))
    }

    fn mkdir(&self, parent: FileId, name: &str, _description: &str) -> BackendResult<StatusCode> {
        self.record(format!("mkdir {parent} {name}"));
        self.reply(None)
    }

    fn set_folder_info(
        &self,
        id: FileId,
        name: &str,
        description: &str,
    ) -> BackendResult<StatusCode> {
        self.record(format!("folder_info {id} {name} {description}"));
        self.reply(Some(id))
    }
}

impl RecycleBin for FakeDrive {
    fn recycled_folders(&self) -> BackendResult<Vec<RecycledFolder>> {
        self.record("rec_folders".into());
        self.reply(None)?;
        Ok(vec![RecycledFolder {
            id: 50,
            name: "old".into(),
            files: Vec::new(),
        }])
    }

    fn recycled_files(&self, folder: FileId) -> BackendResult<Vec<RecycledFile>> {
        self.record(format!("rec_files {folder}"));
        self.reply(None)?;
        Ok(vec![RecycledFile {
            id: 60,
            name: "gone.txt".into(),
            size: 3,
        }])
    }

    fn recover(&self, files: &[FileId], folders: &[FileId]) -> BackendResult<StatusCode> {
        self.record(format!("recover {files:?} {folders:?}"));
        self.reply(None)
    }

    fn purge(&self, files: &[FileId], folders: &[FileId]) -> BackendResult<StatusCode> {
        self.record(format!("purge {files:?} {folders:?}"));
        self.reply(None)
    }

    fn clear(&self) -> BackendResult<StatusCode> {
        self.record("clear".into());
        self.reply(None)
    }

    fn recover_all(&self) -> BackendResult<StatusCode> {
        self.record("recover_all".into());
        self.reply(None)
    }
}

/// Everything emitted so far.
pub fn drain(rx: &mut Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

pub fn notices(events: &[Event]) -> Vec<Notice> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Notice(n) => Some(n.clone()),
            _ => None,
        })
        .collect()
}
