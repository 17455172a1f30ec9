// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the working-tree commands.
//!
//! ```text
//! status [--json]
//! stage PATH... | --all        unstage PATH... | --all
//! commit -m MSG | -F FILE
//! log [-n N] [--json]
//! undo-commit [N]              undo-change PATH... | --all
//! ```

use clap::Args;
use std::path::PathBuf;

/// Arguments for `status`.
#[derive(Debug, Clone, Default, Args)]
pub struct StatusArgs {
    /// Print the branch and changes as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Paths or `--all`, shared by `stage`, `unstage` and `undo-change`.
#[derive(Debug, Clone, Default, Args)]
pub struct PathsArgs {
    /// Paths relative to the repository root.
    #[arg(value_name = "PATH", required_unless_present = "all", conflicts_with = "all")]
    pub paths: Vec<String>,

    /// Apply to every change.
    #[arg(short = 'a', long)]
    pub all: bool,
}

/// Arguments for `commit`.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct CommitArgs {
    /// Commit message; paragraphs separated by blank lines.
    #[arg(short = 'm', long = "message", value_name = "MSG")]
    pub message: Option<String>,

    /// Read the commit message from a file.
    #[arg(short = 'F', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Arguments for `log`.
#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Number of commits to show.
    #[arg(short = 'n', long = "count", default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub count: u64,

    /// Print the commits as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `undo-commit`.
#[derive(Debug, Clone, Args)]
pub struct UndoCommitArgs {
    /// Number of commits to undo.
    #[arg(default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: u64,
}
