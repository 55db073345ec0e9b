//! `ltm ls`, `ltm info`, `ltm link` – read-only drive lookups.

use anyhow::{Context, Result};
use ltm_core::actions::{ListRefresh, ListRequest, MoreInfo, MoreInfoRequest, ShareLookup};
use ltm_core::backend::{EntryInfo, FileId};

use super::Session;

pub async fn run_ls(session: &Session, folder: FileId) -> Result<()> {
    session.act(ListRefresh, ListRequest::all(folder)).await
}

pub async fn run_info(session: &Session, text: String) -> Result<()> {
    session.act(ShareLookup, text).await
}

pub async fn run_link(
    session: &Session,
    target: &str,
    folder: bool,
    direct: bool,
    password: String,
) -> Result<()> {
    let request = if direct {
        MoreInfoRequest::DirectLink {
            url: target.to_string(),
            password,
        }
    } else {
        let id: FileId = target
            .parse()
            .with_context(|| format!("{target} is not an item id"))?;
        let entry = if folder {
            EntryInfo::folder(id, target)
        } else {
            EntryInfo::file(id, target)
        };
        MoreInfoRequest::Entry {
            entry,
            as_link: true,
        }
    };
    session.act(MoreInfo, request).await
}
