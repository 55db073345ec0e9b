//! `ltm recycle ...` – recycle-bin listing and actions.

use anyhow::Result;
use ltm_core::actions::{RecycleAct, RecycleList, RecycleRequest};

use super::Session;
use crate::cli::RecycleCommand;

pub async fn run_recycle(session: &Session, command: RecycleCommand) -> Result<()> {
    let request = match command {
        RecycleCommand::List { folder } => return session.act(RecycleList, folder).await,
        RecycleCommand::Recover { files, folders } => RecycleRequest::Recover { files, folders },
        RecycleCommand::Purge { files, folders } => RecycleRequest::Purge { files, folders },
        RecycleCommand::Clear => RecycleRequest::Clear,
        RecycleCommand::RecoverAll => RecycleRequest::RecoverAll,
    };
    session
        .act(RecycleAct::new(session.cfg.settle_delay()), request)
        .await?;
    session.act(RecycleList, None).await
}
