// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Branch commands.

use anyhow::bail;

use crate::backend::Backend;
use crate::cli::branch::{BranchArgs, BranchesArgs, CreateBranchArgs, DeleteBranchArgs};
use crate::error::Result;

/// Prints the current branch, or checks out `args.name`.
///
/// # Errors
///
/// Returns an error if the branch cannot be read or switched.
pub fn run_branch_command(args: &BranchArgs, backend: &dyn Backend) -> Result<()> {
    match &args.name {
        Some(name) => {
            backend.set_branch(name).map_err(|e| {
                eprintln!("Failed to switch to {name}: {e}");
                e
            })?;
            println!("Switched to {name}");
        }
        None => println!("{}", backend.branch()?),
    }
    Ok(())
}

/// Lists branches, editable branches or tags.
///
/// # Errors
///
/// Returns an error if the backend cannot list them.
pub fn run_branches_command(args: &BranchesArgs, backend: &dyn Backend) -> Result<()> {
    let names = if args.tags {
        backend.tags()?
    } else if args.editable {
        backend.editable_branches()?
    } else {
        backend.branches()?
    };
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Creates and checks out a branch.
///
/// # Errors
///
/// Returns an error if the branch exists or cannot be created.
pub fn run_create_branch_command(args: &CreateBranchArgs, backend: &dyn Backend) -> Result<()> {
    if !backend.create_branch(&args.name, args.empty)? {
        bail!("branch {} was not created", args.name);
    }
    println!("Created branch {}", args.name);
    Ok(())
}

/// Deletes a branch.
///
/// # Errors
///
/// Returns an error if the branch cannot be deleted.
pub fn run_delete_branch_command(args: &DeleteBranchArgs, backend: &dyn Backend) -> Result<()> {
    if !backend.delete_branch(&args.name)? {
        bail!("branch {} was not deleted", args.name);
    }
    println!("Deleted branch {}", args.name);
    Ok(())
}
