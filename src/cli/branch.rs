// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the branch commands.
//!
//! ```text
//! branch [NAME]                  show or switch
//! branches [--editable|--tags]   list
//! create-branch NAME [--empty]
//! delete-branch NAME
//! ```

use clap::Args;

/// Arguments for `branch`.
#[derive(Debug, Clone, Default, Args)]
pub struct BranchArgs {
    /// Branch or tag to check out; prints the current branch when omitted.
    pub name: Option<String>,
}

/// Arguments for `branches`.
#[derive(Debug, Clone, Default, Args)]
pub struct BranchesArgs {
    /// Only branches that can be checked out and committed to.
    #[arg(long, conflicts_with = "tags")]
    pub editable: bool,

    /// List tags instead of branches.
    #[arg(long)]
    pub tags: bool,
}

/// Arguments for `create-branch`.
#[derive(Debug, Clone, Args)]
pub struct CreateBranchArgs {
    /// New branch name.
    pub name: String,

    /// Create an orphan branch with an empty tree.
    #[arg(long)]
    pub empty: bool,
}

/// Arguments for `delete-branch`.
#[derive(Debug, Clone, Args)]
pub struct DeleteBranchArgs {
    /// Branch to delete.
    pub name: String,
}
