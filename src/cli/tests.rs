// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use crate::cli::{Cli, Command};
use clap::Parser;

#[test]
fn test_parse_version() {
    let cli = Cli::try_parse_from(["vcal", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
    assert!(cli.global.configs.is_empty());
}

#[test]
fn test_parse_global_options_after_command() {
    let cli = Cli::try_parse_from([
        "vcal",
        "-C",
        "/tmp/repo",
        "status",
        "-l",
        "5",
        "--set",
        "git.auth_mode=interactive",
        "--config",
        "extra.toml",
    ])
    .unwrap();
    assert_eq!(cli.global.directory, Some(PathBuf::from("/tmp/repo")));
    assert_eq!(cli.global.configs, vec![PathBuf::from("extra.toml")]);
    insta::assert_debug_snapshot!(cli.global.to_config_overrides(), @r#"
    [
        "git.auth_mode=interactive",
        "global.output_log_level=5",
        "global.file_log_level=5",
    ]
    "#);
    assert!(matches!(cli.command, Some(Command::Status(ref args)) if !args.json));
}

#[test]
fn test_file_log_level_overrides_log_level() {
    let cli = Cli::try_parse_from([
        "vcal",
        "-l",
        "2",
        "--file-log-level",
        "6",
        "--log-file",
        "vcal.log",
        "version",
    ])
    .unwrap();
    insta::assert_debug_snapshot!(cli.global.to_config_overrides(), @r#"
    [
        "global.output_log_level=2",
        "global.file_log_level=6",
        "global.log_file=vcal.log",
    ]
    "#);
}

#[test]
fn test_log_level_range() {
    assert!(Cli::try_parse_from(["vcal", "-l", "7", "version"]).is_err());
}

#[test]
fn test_parse_stage_paths_or_all() {
    let cli = Cli::try_parse_from(["vcal", "stage", "a.txt", "dir/b.txt"]).unwrap();
    match cli.command {
        Some(Command::Stage(args)) => {
            assert_eq!(args.paths, vec!["a.txt", "dir/b.txt"]);
            assert!(!args.all);
        }
        other => panic!("unexpected command: {other:?}"),
    }

    let cli = Cli::try_parse_from(["vcal", "unstage", "--all"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Unstage(ref args)) if args.all));

    assert!(Cli::try_parse_from(["vcal", "stage"]).is_err());
    assert!(Cli::try_parse_from(["vcal", "stage", "--all", "a.txt"]).is_err());
}

#[test]
fn test_parse_commit_requires_one_message_source() {
    let cli = Cli::try_parse_from(["vcal", "commit", "-m", "hello"]).unwrap();
    match cli.command {
        Some(Command::Commit(args)) => {
            assert_eq!(args.message.as_deref(), Some("hello"));
            assert!(args.file.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
    assert!(Cli::try_parse_from(["vcal", "commit"]).is_err());
    assert!(Cli::try_parse_from(["vcal", "commit", "-m", "x", "-F", "msg.txt"]).is_err());
}

#[test]
fn test_parse_history_commands() {
    let cli = Cli::try_parse_from(["vcal", "log", "-n", "3", "--json"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Log(ref args)) if args.count == 3 && args.json));

    let cli = Cli::try_parse_from(["vcal", "undo-commit"]).unwrap();
    assert!(matches!(cli.command, Some(Command::UndoCommit(ref args)) if args.count == 1));
    assert!(Cli::try_parse_from(["vcal", "undo-commit", "0"]).is_err());
}

#[test]
fn test_parse_branch_commands() {
    let cli = Cli::try_parse_from(["vcal", "branch"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Branch(ref args)) if args.name.is_none()));

    let cli = Cli::try_parse_from(["vcal", "create-branch", "feat", "--empty"]).unwrap();
    assert!(
        matches!(cli.command, Some(Command::CreateBranch(ref args)) if args.name == "feat" && args.empty)
    );
    assert!(Cli::try_parse_from(["vcal", "branches", "--editable", "--tags"]).is_err());
}

#[test]
fn test_parse_init() {
    let cli = Cli::try_parse_from([
        "vcal",
        "init",
        "/tmp/new",
        "--from",
        "https://example.com/repo.git",
    ])
    .unwrap();
    match cli.command {
        Some(Command::Init(args)) => {
            assert_eq!(args.path, PathBuf::from("/tmp/new"));
            assert_eq!(args.from.as_deref(), Some("https://example.com/repo.git"));
            assert_eq!(args.vcs, "git");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
