// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Working tree and history commands.

use anyhow::{Context, bail};
use serde_json::json;

use crate::backend::Backend;
use crate::change::{ChangeRecord, CommitRecord};
use crate::cli::repo::{CommitArgs, LogArgs, PathsArgs, StatusArgs, UndoCommitArgs};
use crate::error::{Result, VcsResult};
use crate::feature::{Operation, Property, PropertyOp};

const SHORT_ID_LEN: usize = 10;

/// One status line: staged marker, kind and path.
#[must_use]
pub fn format_change(record: &ChangeRecord) -> String {
    let marker = if record.staged { 'S' } else { ' ' };
    let mut line = format!("{marker} {:<9} {}", record.kind.as_str(), record.path);
    if let Some(comment) = &record.comment {
        line.push_str(&format!(" ({comment})"));
    }
    line
}

/// One log line: short id, date, author and title.
#[must_use]
pub fn format_commit(record: &CommitRecord) -> String {
    let id = record
        .id
        .as_deref()
        .map_or("-", |id| id.get(..SHORT_ID_LEN).unwrap_or(id));
    let date = record
        .commit_date
        .map_or_else(|| "-".to_string(), |date| date.format("%Y-%m-%d").to_string());
    let author = record
        .author_name
        .as_deref()
        .or(record.author_username.as_deref())
        .unwrap_or("-");
    let title = record.title.as_deref().unwrap_or_default();
    format!("{id} {date} {author}: {title}")
}

fn current_branch(backend: &dyn Backend) -> VcsResult<Option<String>> {
    let getter = Operation::Property(Property::Branch, PropertyOp::Get);
    if backend.feature(getter).enabled {
        backend.branch().map(Some)
    } else {
        Ok(None)
    }
}

/// Prints the current branch and the change list.
///
/// # Errors
///
/// Returns an error if the backend cannot report its changes.
pub fn run_status_command(args: &StatusArgs, backend: &dyn Backend) -> Result<()> {
    let branch = current_branch(backend)?;
    let changes = backend.changes().map_err(|e| {
        eprintln!("Failed to read changes: {e}");
        e
    })?;

    if args.json {
        let document = json!({ "branch": branch, "changes": changes });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    if let Some(branch) = branch {
        println!("On branch {branch}");
    }
    if changes.is_empty() {
        println!("No changes");
    }
    for record in &changes {
        println!("{}", format_change(record));
    }
    Ok(())
}

/// Runs `one` per path, or `all` when `--all` was given.
fn apply_paths(
    args: &PathsArgs,
    verb: &str,
    one: impl Fn(&str) -> VcsResult<bool>,
    all: impl FnOnce() -> VcsResult<bool>,
) -> Result<()> {
    if args.all {
        if !all()? {
            bail!("failed to {verb} all changes");
        }
        return Ok(());
    }
    let failed: Vec<&str> = args
        .paths
        .iter()
        .map(String::as_str)
        .filter_map(|path| match one(path) {
            Ok(true) => None,
            Ok(false) => Some(Ok(path)),
            Err(e) => Some(Err(e)),
        })
        .collect::<VcsResult<_>>()?;
    if !failed.is_empty() {
        bail!("failed to {verb}: {}", failed.join(", "));
    }
    Ok(())
}

/// Stages the given paths.
///
/// # Errors
///
/// Returns an error if staging is unsupported or any path fails.
pub fn run_stage_command(args: &PathsArgs, backend: &dyn Backend) -> Result<()> {
    apply_paths(args, "stage", |path| backend.stage(path), || backend.stage_all())
}

/// Unstages the given paths.
///
/// # Errors
///
/// Returns an error if unstaging is unsupported or any path fails.
pub fn run_unstage_command(args: &PathsArgs, backend: &dyn Backend) -> Result<()> {
    apply_paths(
        args,
        "unstage",
        |path| backend.unstage(path),
        || backend.unstage_all(),
    )
}

/// Discards unstaged changes of the given paths.
///
/// # Errors
///
/// Returns an error if undoing is unsupported or any path fails.
pub fn run_undo_change_command(args: &PathsArgs, backend: &dyn Backend) -> Result<()> {
    apply_paths(
        args,
        "undo changes of",
        |path| backend.undo_change(path),
        || backend.undo_change_all(),
    )
}

/// Commits the staged changes with a message or a message file.
///
/// # Errors
///
/// Returns an error if the message is empty or the commit fails.
pub fn run_commit_command(args: &CommitArgs, backend: &dyn Backend) -> Result<()> {
    let committed = match (&args.message, &args.file) {
        (Some(message), _) => backend.commit(message, Some(false))?,
        (None, Some(file)) => {
            let file = file
                .to_str()
                .with_context(|| format!("message file path is not UTF-8: {}", file.display()))?;
            backend.commit(file, Some(true))?
        }
        (None, None) => bail!("a commit message is required"),
    };
    if !committed {
        bail!("nothing was committed: the message is empty");
    }
    println!("Committed");
    Ok(())
}

/// Prints the most recent commits, newest first.
///
/// # Errors
///
/// Returns an error if the history cannot be read.
pub fn run_log_command(args: &LogArgs, backend: &dyn Backend) -> Result<()> {
    let count = usize::try_from(args.count)?;
    let commits = backend.get_last_commits(count)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&commits)?);
        return Ok(());
    }
    for record in &commits {
        println!("{}", format_commit(record));
    }
    Ok(())
}

/// Undoes the last commits, keeping their changes staged.
///
/// # Errors
///
/// Returns an error if there are fewer commits than requested.
pub fn run_undo_commit_command(args: &UndoCommitArgs, backend: &dyn Backend) -> Result<()> {
    let count = usize::try_from(args.count)?;
    match backend.undo_commit(count)? {
        Some(record) => println!("Undid {count} commit(s), oldest: {}", format_commit(&record)),
        None => println!("Undid {count} commit(s)"),
    }
    Ok(())
}
