//! CLI for the LTM transfer manager.

mod commands;
mod render;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use ltm_core::backend::{FileId, ROOT_FOLDER};
use ltm_core::config;
use std::path::PathBuf;

use commands::{
    run_check_update, run_download, run_edit, run_info, run_link, run_ls, run_mkdir, run_mv,
    run_passwd, run_recycle, run_rm, run_upload, Session,
};

/// Top-level CLI for the LTM transfer manager.
#[derive(Debug, Parser)]
#[command(name = "ltm")]
#[command(about = "LTM: cloud-drive transfer manager", long_about = None)]
pub struct Cli {
    /// Drive directory (overrides `drive_root` from the config file).
    #[arg(long, global = true, value_name = "DIR")]
    pub drive: Option<PathBuf>,

    /// Host name used in share links.
    #[arg(long, global = true, default_value = "share.local")]
    pub host: String,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download share links (each argument may carry its password after a space).
    Download {
        #[arg(required = true)]
        links: Vec<String>,
        /// Password for links that carry none.
        #[arg(long, short)]
        password: Option<String>,
        /// Destination directory (default: config `download_dir`, then the current directory).
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Maximum concurrent downloads for this run.
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Upload local files or directories.
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Target folder id.
        #[arg(long, default_value_t = ROOT_FOLDER, allow_hyphen_values = true)]
        folder: FileId,
        /// Share password set on each uploaded file.
        #[arg(long)]
        password: Option<String>,
        /// Description set on each uploaded file.
        #[arg(long)]
        description: Option<String>,
    },

    /// List a folder.
    Ls {
        #[arg(default_value_t = ROOT_FOLDER, allow_hyphen_values = true)]
        folder: FileId,
    },

    /// Look up a share link pasted as text.
    Info { text: String },

    /// Show the share link of an item, or the direct link behind a share URL.
    Link {
        /// Item id, or a share URL with `--direct`.
        target: String,
        #[arg(long)]
        folder: bool,
        /// Resolve a share URL to its direct download link.
        #[arg(long)]
        direct: bool,
        #[arg(long, short, default_value = "")]
        password: String,
    },

    /// Create a folder.
    Mkdir {
        name: String,
        #[arg(long, default_value_t = ROOT_FOLDER, allow_hyphen_values = true)]
        parent: FileId,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Change a description, or a folder's name.
    Edit {
        id: FileId,
        #[arg(long)]
        folder: bool,
        /// New folder name.
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Move items to the recycle bin.
    Rm {
        #[arg(required = true)]
        ids: Vec<FileId>,
        /// The ids are folders.
        #[arg(long)]
        folder: bool,
    },

    /// Move items into another folder (without ids, list possible targets).
    Mv {
        ids: Vec<FileId>,
        #[arg(long, allow_hyphen_values = true)]
        to: Option<FileId>,
        #[arg(long)]
        folder: bool,
    },

    /// Set or clear (empty) a share password.
    Passwd {
        id: FileId,
        #[arg(default_value = "")]
        password: String,
        #[arg(long)]
        folder: bool,
    },

    /// Recycle-bin operations.
    Recycle {
        #[command(subcommand)]
        action: RecycleCommand,
    },

    /// Check the configured release endpoints for a newer version.
    CheckUpdate,

    /// Print shell completions.
    Completions { shell: Shell },
}

#[derive(Debug, Subcommand)]
pub enum RecycleCommand {
    /// List the bin, or the files of one recycled folder.
    List { folder: Option<FileId> },
    Recover {
        #[arg(long = "file", value_name = "ID")]
        files: Vec<FileId>,
        #[arg(long = "folder", value_name = "ID")]
        folders: Vec<FileId>,
    },
    /// Delete permanently.
    Purge {
        #[arg(long = "file", value_name = "ID")]
        files: Vec<FileId>,
        #[arg(long = "folder", value_name = "ID")]
        folders: Vec<FileId>,
    },
    Clear,
    RecoverAll,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            clap_complete::generate(shell, &mut Cli::command(), "ltm", &mut std::io::stdout());
            return Ok(());
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        if let CliCommand::CheckUpdate = cli.command {
            return run_check_update(&cfg).await;
        }
        let session = Session::open(cfg, cli.drive, &cli.host)?;

        match cli.command {
            CliCommand::Download {
                links,
                password,
                dest,
                jobs,
            } => run_download(&session, &links, password.as_deref(), dest, jobs).await?,
            CliCommand::Upload {
                paths,
                folder,
                password,
                description,
            } => run_upload(&session, paths, folder, password, description).await?,
            CliCommand::Ls { folder } => run_ls(&session, folder).await?,
            CliCommand::Info { text } => run_info(&session, text).await?,
            CliCommand::Link {
                target,
                folder,
                direct,
                password,
            } => run_link(&session, &target, folder, direct, password).await?,
            CliCommand::Mkdir {
                name,
                parent,
                description,
            } => run_mkdir(&session, name, parent, description).await?,
            CliCommand::Edit {
                id,
                folder,
                name,
                description,
            } => run_edit(&session, id, folder, name, description).await?,
            CliCommand::Rm { ids, folder } => run_rm(&session, &ids, folder).await?,
            CliCommand::Mv { ids, to, folder } => run_mv(&session, &ids, to, folder).await?,
            CliCommand::Passwd {
                id,
                password,
                folder,
            } => run_passwd(&session, id, password, folder).await?,
            CliCommand::Recycle { action } => run_recycle(&session, action).await?,
            CliCommand::CheckUpdate | CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
