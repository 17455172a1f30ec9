// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{ChangeKind, ChangeRecord, CommitRecord};

#[test]
fn test_change_kind_name_round_trip() {
    for kind in ChangeKind::ALL {
        let name = kind.to_string();
        assert_eq!(ChangeKind::from_name(&name).unwrap(), kind);
        assert_eq!(ChangeKind::from_name(&name.to_uppercase()).unwrap(), kind);
    }
}

#[test]
fn test_change_kind_codes_are_stable() {
    let codes: Vec<u8> = ChangeKind::ALL.iter().map(|k| k.code()).collect();
    assert_eq!(codes, vec![0, 1, 2, 3, 10, 11, 98, 99]);
    assert_eq!(ChangeKind::from_code(10).unwrap(), ChangeKind::Renamed);
    assert!(ChangeKind::from_code(4).is_err());
}

#[test]
fn test_change_kind_unknown_name() {
    let err = ChangeKind::from_name("exploded").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r#"invalid argument: change state "exploded" does not exist"#);
}

#[test]
fn test_change_kind_ordering_follows_encoding() {
    assert!(ChangeKind::Unchanged < ChangeKind::Added);
    assert!(ChangeKind::Modified < ChangeKind::Renamed);
    assert!(ChangeKind::Ignored < ChangeKind::Unknown);
}

#[test]
fn test_reportable_kinds() {
    assert!(!ChangeKind::Unchanged.is_reportable());
    assert!(!ChangeKind::Ignored.is_reportable());
    assert!(ChangeKind::Added.is_reportable());
    assert!(ChangeKind::Unknown.is_reportable());
}

#[test]
fn test_change_record_serializes_lowercase_kind() {
    let record = ChangeRecord::new("a.txt", ChangeKind::Added, false);
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"path": "a.txt", "kind": "added", "staged": false})
    );
}

#[test]
fn test_commit_content_composition() {
    let mut commit = CommitRecord {
        title: Some("title".to_string()),
        description: Some("body".to_string()),
        ..CommitRecord::default()
    };
    commit.compose_content();
    assert_eq!(commit.content.as_deref(), Some("title\nbody"));

    let mut empty = CommitRecord::default();
    empty.compose_content();
    assert!(empty.content.is_none());
}
