//! `ltm mkdir`, `ltm edit`, `ltm rm`, `ltm mv`, `ltm passwd` – drive mutations.

use anyhow::Result;
use ltm_core::actions::{
    Delete, EditRequest, EntryEdit, ItemRef, ListRefresh, ListRequest, Move, MoveRequest,
    NewFolder, PasswordEdit, RenameMkdir, SetPassword,
};
use ltm_core::backend::{Catalog, FileId};

use super::Session;

fn items(ids: &[FileId], folder: bool) -> Vec<ItemRef> {
    ids.iter()
        .map(|&id| ItemRef {
            id,
            name: id.to_string(),
            is_file: !folder,
        })
        .collect()
}

pub async fn run_mkdir(
    session: &Session,
    name: String,
    parent: FileId,
    description: String,
) -> Result<()> {
    let drive = session.drive.clone();
    let siblings = tokio::task::spawn_blocking(move || drive.list_folders(parent))
        .await??
        .folders
        .into_iter()
        .map(|f| f.name)
        .collect();
    let request = EditRequest::Mkdir(NewFolder {
        parent,
        name,
        description,
        siblings,
    });
    session
        .act(RenameMkdir::new(session.cfg.settle_delay()), request)
        .await?;
    session.act(ListRefresh, ListRequest::all(parent)).await
}

pub async fn run_edit(
    session: &Session,
    id: FileId,
    folder: bool,
    name: Option<String>,
    description: String,
) -> Result<()> {
    let edit = EntryEdit {
        id,
        is_file: !folder,
        name: id.to_string(),
        new_name: name,
        description,
    };
    if folder && edit.new_name.is_none() {
        anyhow::bail!("--name is required when editing a folder: name and description are saved together");
    }
    session
        .act(RenameMkdir::new(session.cfg.settle_delay()), EditRequest::Edit(vec![edit]))
        .await
}

pub async fn run_rm(session: &Session, ids: &[FileId], folder: bool) -> Result<()> {
    session.act(Delete, items(ids, folder)).await
}

pub async fn run_mv(
    session: &Session,
    ids: &[FileId],
    to: Option<FileId>,
    folder: bool,
) -> Result<()> {
    let request = match to {
        Some(target) if !ids.is_empty() => MoveRequest::Items {
            items: items(ids, folder),
            target,
        },
        None if ids.is_empty() => MoveRequest::Targets,
        _ => anyhow::bail!("pass item ids together with --to <folder id>"),
    };
    session
        .act(Move::new(session.cfg.settle_delay()), request)
        .await
}

pub async fn run_passwd(
    session: &Session,
    id: FileId,
    password: String,
    folder: bool,
) -> Result<()> {
    let edit = PasswordEdit {
        id,
        is_file: !folder,
        password,
    };
    session.act(SetPassword, vec![edit]).await
}
