// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `git log` record parsing.

use chrono::DateTime;

use crate::change::CommitRecord;

/// Pretty format for `git log --date=unix`; records end with NUL.
pub const LOG_FORMAT: &str = "id:%h%nauthor_username:%an%nauthor_email:%ae%ncommit_date:%ad%ntitle:%s%ndescription:%n%b%x00";

/// Fields filled by [`parse_record`].
pub const COMMIT_ATTRS: [&str; 7] = [
    "id",
    "title",
    "description",
    "content",
    "author_username",
    "author_email",
    "commit_date",
];

const DESCRIPTION_MARKER: &str = "\ndescription:\n";

/// Splits `git log` output into commit records, newest first.
#[must_use]
pub fn parse_history(output: &str) -> Vec<CommitRecord> {
    output.split('\0').filter_map(parse_record).collect()
}

/// Parses one NUL-terminated record; `None` for blank input.
#[must_use]
pub fn parse_record(record: &str) -> Option<CommitRecord> {
    let record = record.trim_start();
    if record.is_empty() {
        return None;
    }

    let (header, description) = match record.find(DESCRIPTION_MARKER) {
        Some(at) => (&record[..at], &record[at + DESCRIPTION_MARKER.len()..]),
        None => (record, ""),
    };

    let mut commit = CommitRecord {
        description: Some(description.to_string()),
        ..CommitRecord::default()
    };
    for line in header.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.to_string();
        match key {
            "id" => commit.id = Some(value),
            "title" => commit.title = Some(value),
            "author_username" => commit.author_username = Some(value),
            "author_email" => commit.author_email = Some(value),
            "commit_date" => {
                commit.commit_date = value
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
            }
            _ => {}
        }
    }
    commit.compose_content();
    Some(commit)
}
