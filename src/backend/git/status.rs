// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `git status --porcelain=v1 -z` parsing.
//!
//! ```text
//! "## main...origin/main [ahead 1, behind 2]\0"   header (with -b)
//! " M src/lib.rs\0"                               XY path
//! "R  new.rs\0old.rs\0"                           old.rs removed, new.rs added
//! "?? notes.txt\0"                                untracked
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::change::{ChangeKind, ChangeRecord};
use crate::error::{VcsError, VcsResult};

/// Branch line of `git status -b`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchStatus {
    pub local: String,
    pub remote: Option<String>,
    pub ahead: u64,
    pub behind: u64,
}

/// One porcelain entry before splitting into records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub staged: ChangeKind,
    pub unstaged: ChangeKind,
    /// Source path of a rename or copy.
    pub source: Option<String>,
}

impl StatusEntry {
    /// Records for the non-unchanged sides, unstaged first.
    #[must_use]
    pub fn records(&self) -> Vec<ChangeRecord> {
        let comment = self.source.as_ref().map(|src| format!("from {src}"));
        [(self.unstaged, false), (self.staged, true)]
            .into_iter()
            .filter(|(kind, _)| kind.is_reportable())
            .map(|(kind, staged)| ChangeRecord {
                comment: comment.clone(),
                ..ChangeRecord::new(self.path.clone(), kind, staged)
            })
            .collect()
    }
}

/// Parsed `git status` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub branch: Option<BranchStatus>,
    pub entries: Vec<StatusEntry>,
}

impl StatusReport {
    /// Flattened change records.
    #[must_use]
    pub fn records(&self) -> Vec<ChangeRecord> {
        self.entries.iter().flat_map(StatusEntry::records).collect()
    }

    /// Merges all entries into one named `pathspec` when it selects more
    /// than one file. A side whose kinds disagree becomes `Modified`.
    ///
    /// An entry for exactly `pathspec` wins over the merge, so a rename
    /// source listed next to a file is dropped.
    pub fn collapse(&mut self, pathspec: &str) {
        if pathspec == "." || self.entries.len() < 2 {
            return;
        }
        if self.entries.iter().any(|entry| entry.path == pathspec) {
            self.entries.retain(|entry| entry.path == pathspec);
            return;
        }
        let mut merged = StatusEntry {
            path: pathspec.to_string(),
            staged: self.entries[0].staged,
            unstaged: self.entries[0].unstaged,
            source: None,
        };
        for entry in &self.entries[1..] {
            if merged.staged != ChangeKind::Modified && merged.staged != entry.staged {
                merged.staged = ChangeKind::Modified;
            }
            if merged.unstaged != ChangeKind::Modified && merged.unstaged != entry.unstaged {
                merged.unstaged = ChangeKind::Modified;
            }
        }
        self.entries = vec![merged];
    }
}

/// Maps one porcelain status letter.
#[must_use]
pub const fn code_kind(code: char) -> ChangeKind {
    match code {
        ' ' => ChangeKind::Unchanged,
        'A' => ChangeKind::Added,
        // source side of a rename
        'D' | 'R' => ChangeKind::Removed,
        'M' => ChangeKind::Modified,
        'C' => ChangeKind::Copied,
        '!' => ChangeKind::Ignored,
        _ => ChangeKind::Unknown,
    }
}

/// Parses NUL-separated porcelain output.
///
/// # Errors
///
/// Returns an error only if the header pattern fails to compile.
pub fn parse_status(output: &str, with_branch: bool) -> VcsResult<StatusReport> {
    let mut report = StatusReport::default();
    let mut records = output.split('\0').peekable();

    if with_branch
        && let Some(first) = records.peek()
        && let Some(branch) = parse_branch_header(first)?
    {
        report.branch = Some(branch);
        records.next();
    }

    while let Some(record) = records.next() {
        if record.is_empty() {
            break;
        }
        let mut codes = record.chars();
        let (Some(x), Some(y)) = (codes.next(), codes.next()) else {
            continue;
        };
        let path = record.get(3..).unwrap_or_default().to_string();

        if x == '?' && y == '?' {
            report.entries.push(StatusEntry {
                path,
                staged: ChangeKind::Unchanged,
                unstaged: ChangeKind::Added,
                source: None,
            });
            continue;
        }

        let source = if matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C') {
            records.next().map(str::to_string)
        } else {
            None
        };
        let mut entry = StatusEntry {
            path,
            staged: code_kind(x),
            unstaged: code_kind(y),
            source,
        };
        if (x == 'R' || y == 'R')
            && let Some(source) = &entry.source
        {
            report.entries.push(StatusEntry {
                path: source.clone(),
                staged: rename_source_kind(x),
                unstaged: rename_source_kind(y),
                source: None,
            });
            if x == 'R' {
                entry.staged = ChangeKind::Added;
            }
            if y == 'R' {
                entry.unstaged = ChangeKind::Added;
            }
        }
        report.entries.push(entry);
    }
    Ok(report)
}

/// Kind of the rename source on one side.
const fn rename_source_kind(code: char) -> ChangeKind {
    if code == 'R' {
        ChangeKind::Removed
    } else {
        ChangeKind::Unchanged
    }
}

static HEADER_REGEX: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^## (.+?)(?:\.\.\.(.+?))?(?: \[([a-z]+ \d+)(?:, )?([a-z]+ \d+)?\]| \((.+?)\))?$",
    )
});

fn header_regex() -> VcsResult<&'static Regex> {
    HEADER_REGEX
        .as_ref()
        .map_err(|err| VcsError::other(format!("failed to compile status header regex: {err}")))
}

/// Parses the `## ...` branch line; `None` when `line` is not a header.
///
/// # Errors
///
/// Returns an error only if the header pattern fails to compile.
pub fn parse_branch_header(line: &str) -> VcsResult<Option<BranchStatus>> {
    let line = line.strip_suffix(" [gone]").unwrap_or(line);
    let Some(captures) = header_regex()?.captures(line) else {
        return Ok(None);
    };

    let mut local = captures
        .get(1)
        .map_or_else(String::new, |m| m.as_str().to_string());
    for prefix in ["No commits yet on ", "Initial commit on "] {
        if let Some(name) = local.strip_prefix(prefix) {
            local = name.to_string();
        }
    }

    let mut status = BranchStatus {
        local,
        remote: captures.get(2).map(|m| m.as_str().to_string()),
        ..BranchStatus::default()
    };
    for group in [captures.get(3), captures.get(4)].into_iter().flatten() {
        let Some((word, count)) = group.as_str().rsplit_once(' ') else {
            continue;
        };
        let count = count.parse().unwrap_or(0);
        match word {
            "ahead" => status.ahead = count,
            "behind" => status.behind = count,
            _ => {}
        }
    }
    Ok(Some(status))
}
