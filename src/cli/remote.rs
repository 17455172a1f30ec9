// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the commands that reach a remote or create repositories.

use clap::Args;
use std::path::PathBuf;

/// Arguments for `fetch`.
#[derive(Debug, Clone, Default, Args)]
pub struct FetchArgs {
    /// Update the remote-tracking refs before counting.
    #[arg(long)]
    pub sync: bool,

    /// Print the counts as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `init`.
#[derive(Debug, Clone, Args)]
pub struct InitArgs {
    /// Directory of the new repository; created when missing.
    pub path: PathBuf,

    /// Remote URL to populate the repository from.
    #[arg(long, value_name = "URL")]
    pub from: Option<String>,

    /// Version control system to create.
    #[arg(long, value_name = "NAME", default_value = "git")]
    pub vcs: String,
}
