// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for vcal using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! vcal [global options] <command>
//! status | branch | branches | create-branch | delete-branch
//! stage | unstage | commit | log | undo-commit | undo-change
//! fetch | pull | push | init
//! features | options | configs | version
//! ```

pub mod branch;
pub mod global;
pub mod remote;
pub mod repo;

#[cfg(test)]
mod tests;

use crate::cli::branch::{BranchArgs, BranchesArgs, CreateBranchArgs, DeleteBranchArgs};
use crate::cli::global::GlobalOptions;
use crate::cli::remote::{FetchArgs, InitArgs};
use crate::cli::repo::{CommitArgs, LogArgs, PathsArgs, StatusArgs, UndoCommitArgs};
use clap::{Parser, Subcommand};

/// Version Control Abstraction Layer
///
/// Drives a repository through capability-aware VCS backends.
#[derive(Debug, Parser)]
#[command(
    name = "vcal",
    author,
    version,
    about = "Version Control Abstraction Layer",
    long_about = "vcal Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Opens the repository containing the current directory (or -C DIR)\n\
                  with the best available driver and runs one operation on it.\n\
                  `vcal features` lists what the selected driver supports.",
    after_help = "CONFIG FILES:\n\n\
                  vcal reads `vcal.toml` from the current directory unless\n\
                  --no-local-config is given, then every --config file in order,\n\
                  then VCAL_{SECTION}__{KEY} environment variables, then --set\n\
                  overrides. `vcal options` prints the merged result."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    Version,

    /// Lists all options and their values.
    Options,

    /// Lists the configuration files used.
    Configs,

    /// Shows which operations the selected driver supports.
    Features,

    /// Shows the current branch and the changes.
    Status(StatusArgs),

    /// Shows or switches the current branch.
    Branch(BranchArgs),

    /// Lists branches or tags.
    Branches(BranchesArgs),

    /// Creates and checks out a branch.
    #[command(name = "create-branch")]
    CreateBranch(CreateBranchArgs),

    /// Deletes a branch.
    #[command(name = "delete-branch")]
    DeleteBranch(DeleteBranchArgs),

    /// Stages paths.
    Stage(PathsArgs),

    /// Unstages paths.
    Unstage(PathsArgs),

    /// Commits the staged changes.
    Commit(CommitArgs),

    /// Shows the last commits.
    Log(LogArgs),

    /// Undoes commits, keeping their changes staged.
    #[command(name = "undo-commit")]
    UndoCommit(UndoCommitArgs),

    /// Discards unstaged changes.
    #[command(name = "undo-change")]
    UndoChange(PathsArgs),

    /// Counts commits to pull and push.
    Fetch(FetchArgs),

    /// Pulls from the remote.
    Pull,

    /// Pushes to the remote.
    Push,

    /// Creates a repository, optionally from a remote.
    Init(InitArgs),
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
