//! Tests for download and upload subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use ltm_core::backend::ROOT_FOLDER;
use std::path::{Path, PathBuf};

#[test]
fn cli_parse_download() {
    match parse(&["ltm", "download", "https://s.test/iabcdef"]) {
        CliCommand::Download {
            links,
            password,
            dest,
            jobs,
        } => {
            assert_eq!(links, ["https://s.test/iabcdef"]);
            assert!(password.is_none());
            assert!(dest.is_none());
            assert!(jobs.is_none());
        }
        _ => panic!("expected Download"),
    }
}

#[test]
fn cli_parse_download_options() {
    match parse(&[
        "ltm",
        "download",
        "https://s.test/iabcdef",
        "https://s.test/b123456 pwd:x1",
        "-p",
        "abc",
        "--dest",
        "/tmp",
        "--jobs",
        "5",
    ]) {
        CliCommand::Download {
            links,
            password,
            dest,
            jobs,
        } => {
            assert_eq!(links.len(), 2);
            assert_eq!(password.as_deref(), Some("abc"));
            assert_eq!(dest.as_deref(), Some(Path::new("/tmp")));
            assert_eq!(jobs, Some(5));
        }
        _ => panic!("expected Download with options"),
    }
}

#[test]
fn cli_parse_download_requires_a_link() {
    assert!(Cli::try_parse_from(["ltm", "download"]).is_err());
}

#[test]
fn cli_parse_upload_defaults_to_root() {
    match parse(&["ltm", "upload", "a.txt", "dir"]) {
        CliCommand::Upload {
            paths,
            folder,
            password,
            description,
        } => {
            assert_eq!(paths, [PathBuf::from("a.txt"), PathBuf::from("dir")]);
            assert_eq!(folder, ROOT_FOLDER);
            assert!(password.is_none() && description.is_none());
        }
        _ => panic!("expected Upload"),
    }
}

#[test]
fn cli_parse_upload_post_steps() {
    match parse(&[
        "ltm",
        "upload",
        "a.txt",
        "--folder",
        "42",
        "--password",
        "pw12",
        "--description",
        "notes",
    ]) {
        CliCommand::Upload {
            folder,
            password,
            description,
            ..
        } => {
            assert_eq!(folder, 42);
            assert_eq!(password.as_deref(), Some("pw12"));
            assert_eq!(description.as_deref(), Some("notes"));
        }
        _ => panic!("expected Upload with post-steps"),
    }
}

#[test]
fn cli_parse_global_drive_flag() {
    let cli = Cli::try_parse_from(["ltm", "ls", "--drive", "/srv/share"]).unwrap();
    assert_eq!(cli.drive.as_deref(), Some(Path::new("/srv/share")));
    assert_eq!(cli.host, "share.local");
}
