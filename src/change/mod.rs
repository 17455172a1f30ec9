// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! File change states and revision records.
//!
//! ```text
//! ChangeKind   Unchanged=0 Added=1 Removed=2 Modified=3
//!              Renamed=10 Copied=11 Ignored=98 Unknown=99
//! ChangeRecord { path, kind, staged, comment }
//! CommitRecord { id, title, description, content, author_*, commit_date }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VcsError;

/// The kind of change a file has relative to the last tracked state.
///
/// The integer encoding is stable and used for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ChangeKind {
    Unchanged = 0,
    Added = 1,
    Removed = 2,
    Modified = 3,
    Renamed = 10,
    Copied = 11,
    Ignored = 98,
    Unknown = 99,
}

impl ChangeKind {
    /// All defined kinds, in encoding order.
    pub const ALL: [Self; 8] = [
        Self::Unchanged,
        Self::Added,
        Self::Removed,
        Self::Modified,
        Self::Renamed,
        Self::Copied,
        Self::Ignored,
        Self::Unknown,
    ];

    /// Returns the lowercase member name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Renamed => "renamed",
            Self::Copied => "copied",
            Self::Ignored => "ignored",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the stable integer encoding.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks up a kind by its integer encoding.
    ///
    /// # Errors
    ///
    /// Returns `VcsError::InvalidArgument` for codes with no member.
    pub fn from_code(code: u8) -> Result<Self, VcsError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or_else(|| {
                VcsError::invalid_argument(format!("change state {code} does not exist"))
            })
    }

    /// Case-insensitive lookup by member name.
    ///
    /// # Errors
    ///
    /// Returns `VcsError::InvalidArgument` if no member has that name.
    pub fn from_name(name: &str) -> Result<Self, VcsError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                VcsError::invalid_argument(format!("change state {name:?} does not exist"))
            })
    }

    /// Returns whether records of this kind are reported to consumers.
    #[must_use]
    pub const fn is_reportable(self) -> bool {
        !matches!(self, Self::Unchanged | Self::Ignored)
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeKind {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// One row describing a file's difference from the last tracked state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: String,
    pub kind: ChangeKind,
    pub staged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ChangeRecord {
    /// Creates a record without a comment.
    pub fn new(path: impl Into<String>, kind: ChangeKind, staged: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            staged,
            comment: None,
        }
    }
}

/// Metadata for a single revision.
///
/// Every field is optional: drivers fill what their history supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub author_name: Option<String>,
    pub author_username: Option<String>,
    pub author_email: Option<String>,
    pub commit_date: Option<DateTime<Utc>>,
}

impl CommitRecord {
    /// Recomputes `content` as `title + "\n" + description`.
    ///
    /// A missing side counts as empty; `content` stays `None` when both are.
    pub fn compose_content(&mut self) {
        if self.title.is_none() && self.description.is_none() {
            self.content = None;
            return;
        }
        self.content = Some(format!(
            "{}\n{}",
            self.title.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default()
        ));
    }
}

#[cfg(test)]
mod tests;
