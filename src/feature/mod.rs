// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Static capability table for backend operations.
//!
//! Every operation a backend can expose owns one bit in [`Capability`].
//! Property operations (get/set/del) are separate bits, so a driver that only
//! reads `branch` reports `BRANCH_GET` and leaves `BRANCH_SET`/`BRANCH_DEL`
//! clear.
//!
//! ```text
//!   Driver::capabilities() ──► Capability (u64 mask)
//!                                   │
//!        CapabilityGroup::members() ┤  mask intersection
//!                                   ▼
//!          check(group) = popcount(caps & members)
//!      check_all(group) = caps ⊇ members
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::{VcsError, VcsResult};

bitflags! {
    /// One bit per named backend operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capability: u64 {
        const CREATE = 1 << 0;
        const CREDENTIALS_GET = 1 << 1;
        const CREDENTIALS_SET = 1 << 2;
        const CREDENTIALS_DEL = 1 << 3;
        const CHANGES_GET = 1 << 4;
        const CHANGES_SET = 1 << 5;
        const CHANGES_DEL = 1 << 6;
        const CHANGE = 1 << 7;
        const BRANCH_GET = 1 << 8;
        const BRANCH_SET = 1 << 9;
        const BRANCH_DEL = 1 << 10;
        const BRANCHES_GET = 1 << 11;
        const BRANCHES_SET = 1 << 12;
        const BRANCHES_DEL = 1 << 13;
        const EDITABLE_BRANCHES_GET = 1 << 14;
        const EDITABLE_BRANCHES_SET = 1 << 15;
        const EDITABLE_BRANCHES_DEL = 1 << 16;
        const CREATE_BRANCH = 1 << 17;
        const DELETE_BRANCH = 1 << 18;
        const STAGE = 1 << 19;
        const UNSTAGE = 1 << 20;
        const STAGE_ALL = 1 << 21;
        const UNSTAGE_ALL = 1 << 22;
        const COMMIT = 1 << 23;
        const FETCH = 1 << 24;
        const PUSH = 1 << 25;
        const PULL = 1 << 26;
        const UNDO_COMMIT = 1 << 27;
        const UNDO_CHANGE = 1 << 28;
        const UNDO_CHANGE_ALL = 1 << 29;
        const GET_LAST_COMMITS = 1 << 30;
        const TAGS_GET = 1 << 31;
        const TAGS_SET = 1 << 32;
        const TAGS_DEL = 1 << 33;
    }
}

/// Accessor kind of a property operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyOp {
    Get,
    Set,
    Del,
}

impl PropertyOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Del => "del",
        }
    }
}

impl fmt::Display for PropertyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyOp {
    type Err = VcsError;

    /// Accepts `get/getter/fget`, `set/setter/fset` and `del/deleter/fdel`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" | "getter" | "fget" => Ok(Self::Get),
            "set" | "setter" | "fset" => Ok(Self::Set),
            "del" | "deleter" | "fdel" => Ok(Self::Del),
            _ => Err(VcsError::invalid_argument(format!(
                "unknown property operation {s:?}"
            ))),
        }
    }
}

/// Backend properties that expose get/set/del accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Property {
    Credentials,
    Changes,
    Branch,
    Branches,
    EditableBranches,
    Tags,
}

impl Property {
    pub const ALL: [Self; 6] = [
        Self::Credentials,
        Self::Changes,
        Self::Branch,
        Self::Branches,
        Self::EditableBranches,
        Self::Tags,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
            Self::Changes => "changes",
            Self::Branch => "branch",
            Self::Branches => "branches",
            Self::EditableBranches => "editable_branches",
            Self::Tags => "tags",
        }
    }

    const fn capability(self, op: PropertyOp) -> Capability {
        match (self, op) {
            (Self::Credentials, PropertyOp::Get) => Capability::CREDENTIALS_GET,
            (Self::Credentials, PropertyOp::Set) => Capability::CREDENTIALS_SET,
            (Self::Credentials, PropertyOp::Del) => Capability::CREDENTIALS_DEL,
            (Self::Changes, PropertyOp::Get) => Capability::CHANGES_GET,
            (Self::Changes, PropertyOp::Set) => Capability::CHANGES_SET,
            (Self::Changes, PropertyOp::Del) => Capability::CHANGES_DEL,
            (Self::Branch, PropertyOp::Get) => Capability::BRANCH_GET,
            (Self::Branch, PropertyOp::Set) => Capability::BRANCH_SET,
            (Self::Branch, PropertyOp::Del) => Capability::BRANCH_DEL,
            (Self::Branches, PropertyOp::Get) => Capability::BRANCHES_GET,
            (Self::Branches, PropertyOp::Set) => Capability::BRANCHES_SET,
            (Self::Branches, PropertyOp::Del) => Capability::BRANCHES_DEL,
            (Self::EditableBranches, PropertyOp::Get) => Capability::EDITABLE_BRANCHES_GET,
            (Self::EditableBranches, PropertyOp::Set) => Capability::EDITABLE_BRANCHES_SET,
            (Self::EditableBranches, PropertyOp::Del) => Capability::EDITABLE_BRANCHES_DEL,
            (Self::Tags, PropertyOp::Get) => Capability::TAGS_GET,
            (Self::Tags, PropertyOp::Set) => Capability::TAGS_SET,
            (Self::Tags, PropertyOp::Del) => Capability::TAGS_DEL,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain (non-property) backend operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Create,
    Change,
    CreateBranch,
    DeleteBranch,
    Stage,
    Unstage,
    StageAll,
    UnstageAll,
    Commit,
    Fetch,
    Push,
    Pull,
    UndoCommit,
    UndoChange,
    UndoChangeAll,
    GetLastCommits,
}

impl Method {
    pub const ALL: [Self; 16] = [
        Self::Create,
        Self::Change,
        Self::CreateBranch,
        Self::DeleteBranch,
        Self::Stage,
        Self::Unstage,
        Self::StageAll,
        Self::UnstageAll,
        Self::Commit,
        Self::Fetch,
        Self::Push,
        Self::Pull,
        Self::UndoCommit,
        Self::UndoChange,
        Self::UndoChangeAll,
        Self::GetLastCommits,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Change => "change",
            Self::CreateBranch => "create_branch",
            Self::DeleteBranch => "delete_branch",
            Self::Stage => "stage",
            Self::Unstage => "unstage",
            Self::StageAll => "stage_all",
            Self::UnstageAll => "unstage_all",
            Self::Commit => "commit",
            Self::Fetch => "fetch",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::UndoCommit => "undo_commit",
            Self::UndoChange => "undo_change",
            Self::UndoChangeAll => "undo_change_all",
            Self::GetLastCommits => "get_last_commits",
        }
    }

    const fn capability(self) -> Capability {
        match self {
            Self::Create => Capability::CREATE,
            Self::Change => Capability::CHANGE,
            Self::CreateBranch => Capability::CREATE_BRANCH,
            Self::DeleteBranch => Capability::DELETE_BRANCH,
            Self::Stage => Capability::STAGE,
            Self::Unstage => Capability::UNSTAGE,
            Self::StageAll => Capability::STAGE_ALL,
            Self::UnstageAll => Capability::UNSTAGE_ALL,
            Self::Commit => Capability::COMMIT,
            Self::Fetch => Capability::FETCH,
            Self::Push => Capability::PUSH,
            Self::Pull => Capability::PULL,
            Self::UndoCommit => Capability::UNDO_COMMIT,
            Self::UndoChange => Capability::UNDO_CHANGE,
            Self::UndoChangeAll => Capability::UNDO_CHANGE_ALL,
            Self::GetLastCommits => Capability::GET_LAST_COMMITS,
        }
    }
}

/// A reference to a single backend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Method(Method),
    Property(Property, PropertyOp),
}

impl Operation {
    /// Every known operation, methods first then property accessors.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let methods = Method::ALL.into_iter().map(Self::Method);
        let properties = Property::ALL.into_iter().flat_map(|property| {
            [PropertyOp::Get, PropertyOp::Set, PropertyOp::Del]
                .into_iter()
                .map(move |op| Self::Property(property, op))
        });
        methods.chain(properties).collect()
    }

    /// Capability bit backing this operation.
    #[must_use]
    pub const fn capability(self) -> Capability {
        match self {
            Self::Method(method) => method.capability(),
            Self::Property(property, op) => property.capability(op),
        }
    }

    /// Operation name without the accessor suffix (`branch`, `commit`).
    #[must_use]
    pub const fn base_name(self) -> &'static str {
        match self {
            Self::Method(method) => method.as_str(),
            Self::Property(property, _) => property.as_str(),
        }
    }

    /// Parses a method name or a property name plus accessor.
    ///
    /// # Errors
    ///
    /// Returns `VcsError::InvalidArgument` for unknown names, for methods given
    /// an accessor, and for properties given none.
    pub fn parse(name: &str, op: Option<&str>) -> VcsResult<Self> {
        if let Some(method) = Method::ALL.into_iter().find(|m| m.as_str() == name) {
            return match op {
                None => Ok(Self::Method(method)),
                Some(op) => Err(VcsError::invalid_argument(format!(
                    "{name} is not a property (got operation {op:?})"
                ))),
            };
        }
        let property = Property::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| VcsError::invalid_argument(format!("unknown feature {name:?}")))?;
        let op = op.ok_or_else(|| {
            VcsError::invalid_argument(format!("property {name} requires an operation"))
        })?;
        Ok(Self::Property(property, op.parse()?))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(method) => f.write_str(method.as_str()),
            Self::Property(property, op) => write!(f, "{}.{op}", property.as_str()),
        }
    }
}

impl FromStr for Operation {
    type Err = VcsError;

    /// Parses `commit` or dotted `branch.get` / `branch.setter`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((name, op)) => Self::parse(name, Some(op)),
            None => Self::parse(s, None),
        }
    }
}

/// Per-feature metadata such as `states`, `empty`, `attrs`, `branch`.
pub type FeatureExtra = BTreeMap<String, serde_json::Value>;

/// An operation handle: name, enabled state and extra metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub operation: Operation,
    pub enabled: bool,
    pub extra: FeatureExtra,
}

impl Feature {
    #[must_use]
    pub const fn new(operation: Operation, enabled: bool, extra: FeatureExtra) -> Self {
        Self {
            operation,
            enabled,
            extra,
        }
    }

    /// Dotted operation name (`commit`, `branch.set`).
    #[must_use]
    pub fn name(&self) -> String {
        self.operation.to_string()
    }

    /// Reads a boolean flag from `extra`, false when absent.
    #[must_use]
    pub fn extra_flag(&self, key: &str) -> bool {
        self.extra
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation)
    }
}

/// Named sets of operations used to rank drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CapabilityGroup {
    Create,
    Status,
    Branches,
    Stage,
    Commit,
    Remote,
    Undo,
    History,
}

impl CapabilityGroup {
    pub const ALL: [Self; 8] = [
        Self::Create,
        Self::Status,
        Self::Branches,
        Self::Stage,
        Self::Commit,
        Self::Remote,
        Self::Undo,
        Self::History,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Status => "status",
            Self::Branches => "branches",
            Self::Stage => "stage",
            Self::Commit => "commit",
            Self::Remote => "remote",
            Self::Undo => "undo",
            Self::History => "history",
        }
    }

    /// Operations belonging to this group.
    #[must_use]
    pub const fn members(self) -> Capability {
        match self {
            Self::Create => Capability::CREATE,
            Self::Status => Capability::BRANCH_GET
                .union(Capability::CHANGE)
                .union(Capability::CHANGES_GET),
            Self::Branches => Capability::BRANCH_GET
                .union(Capability::BRANCH_SET)
                .union(Capability::BRANCHES_GET)
                .union(Capability::EDITABLE_BRANCHES_GET)
                .union(Capability::CREATE_BRANCH)
                .union(Capability::DELETE_BRANCH),
            Self::Stage => Capability::STAGE
                .union(Capability::UNSTAGE)
                .union(Capability::STAGE_ALL)
                .union(Capability::UNSTAGE_ALL),
            Self::Commit => Capability::COMMIT.union(Capability::UNDO_COMMIT),
            Self::Remote => Capability::FETCH
                .union(Capability::PUSH)
                .union(Capability::PULL),
            Self::Undo => Capability::UNSTAGE
                .union(Capability::UNDO_COMMIT)
                .union(Capability::UNDO_CHANGE)
                .union(Capability::UNDO_CHANGE_ALL),
            Self::History => Capability::TAGS_GET.union(Capability::GET_LAST_COMMITS),
        }
    }
}

impl fmt::Display for CapabilityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityGroup {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == s)
            .ok_or_else(|| VcsError::invalid_argument(format!("unknown group {s:?}")))
    }
}

/// Number of enabled members of `group`.
#[must_use]
pub const fn check(capabilities: Capability, group: CapabilityGroup) -> usize {
    capabilities.intersection(group.members()).bits().count_ones() as usize
}

/// Whether every member of `group` is enabled.
#[must_use]
pub const fn check_all(capabilities: Capability, group: CapabilityGroup) -> bool {
    capabilities.contains(group.members())
}

/// Sum of [`check`] over every group; the driver ranking score.
#[must_use]
pub fn score(capabilities: Capability) -> usize {
    CapabilityGroup::ALL
        .into_iter()
        .map(|group| check(capabilities, group))
        .sum()
}
