// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::{Arc, Mutex};

use super::{
    AuthError, BackendUnavailable, DispatchError, FeatureError, PropertyError, VcsError, VcsResult,
};
use crate::credentials::{CredentialKey, Credentials, CredentialsHandle};
use crate::feature::{Feature, FeatureExtra, Method, Operation, Property, PropertyOp};

#[derive(Debug, Default)]
struct RecordingHandle {
    applied: Mutex<Vec<Credentials>>,
}

impl CredentialsHandle for RecordingHandle {
    fn current(&self) -> Credentials {
        Credentials::default()
    }

    fn apply(&self, credentials: Credentials) -> VcsResult<()> {
        self.applied.lock().unwrap().push(credentials);
        Ok(())
    }
}

fn user_password() -> Vec<CredentialKey> {
    vec![CredentialKey::Username, CredentialKey::Password]
}

#[test]
fn test_vcs_error_size() {
    // Box<str> variants (InvalidArgument, NoBackend, Other) are 16 bytes
    // With discriminant + alignment = 24 bytes
    let size = std::mem::size_of::<VcsError>();
    assert!(size <= 24, "VcsError is {size} bytes, expected <= 24");
}

#[test]
fn test_vcs_result_size() {
    let size = std::mem::size_of::<VcsResult<()>>();
    assert!(size <= 24, "VcsResult<()> is {size} bytes, expected <= 24");
}

#[test]
fn test_backend_unavailable_missing_dependencies() {
    let err = BackendUnavailable::builder()
        .directory("/tmp/repo")
        .driver("git")
        .programs(vec!["git".to_string()])
        .message("git executable not found")
        .build();
    assert!(err.missing_dependencies());
    assert!(err.is_valid_repository);

    let err = BackendUnavailable::builder()
        .directory("/tmp/repo")
        .driver("git")
        .is_valid_repository(false)
        .message("not a repository")
        .build();
    assert!(!err.missing_dependencies());
    insta::assert_snapshot!(err.to_string(), @r#"git cannot serve "/tmp/repo": not a repository"#);
}

#[test]
fn test_feature_error_display() {
    let feature = Feature::new(Operation::Method(Method::Commit), false, FeatureExtra::new());
    let err = VcsError::from(FeatureError::not_implemented(feature));
    insta::assert_snapshot!(err.to_string(), @"commit failed: not implemented");
}

#[test]
fn test_property_error_display_and_raw() {
    let err = VcsError::from(
        PropertyError::new(Property::Branch, PropertyOp::Set, "branch is nope")
            .with_raw("error: pathspec 'nope' did not match"),
    );
    insta::assert_snapshot!(err.to_string(), @"cannot set property 'branch': branch is nope");
    assert_eq!(err.raw(), Some("error: pathspec 'nope' did not match"));
}

#[test]
fn test_auth_error_rejects_missing_required_key() {
    let handle = Arc::new(RecordingHandle::default());
    let err = AuthError::new("denied", user_password(), Credentials::default())
        .with_handle(handle.clone());

    let partial = Credentials::default().with(CredentialKey::Username, Some("alice"));
    let result = err.set_credentials(partial);
    assert!(matches!(result, Err(VcsError::InvalidArgument(_))));
    assert!(handle.applied.lock().unwrap().is_empty());
}

#[test]
fn test_auth_error_applies_through_handle() {
    let handle = Arc::new(RecordingHandle::default());
    let err = AuthError::new("denied", user_password(), Credentials::default())
        .with_handle(handle.clone());

    let creds = Credentials::default()
        .with(CredentialKey::Username, Some("alice"))
        .with(CredentialKey::Password, Some("s3cret"));
    err.set_credentials(creds.clone()).unwrap();
    assert_eq!(handle.applied.lock().unwrap().as_slice(), &[creds]);
}

#[test]
fn test_auth_error_without_handle() {
    let err = AuthError::new("denied", vec![CredentialKey::Token], Credentials::default());
    let creds = Credentials::default().with(CredentialKey::Token, Some("t"));
    assert!(err.set_credentials(creds).is_err());
}

#[test]
fn test_auth_error_debug_hides_handle() {
    let err = AuthError::new("denied", vec![], Credentials::default())
        .with_handle(Arc::new(RecordingHandle::default()));
    let debug = format!("{err:?}");
    assert!(debug.contains("has_handle: true"));
}

#[test]
fn test_dispatch_error_display() {
    let err = DispatchError::AuthenticationFailed(Box::new(AuthError::new(
        "prompt cancelled",
        vec![],
        Credentials::default(),
    )));
    insta::assert_snapshot!(err.to_string(), @"authentication failed: prompt cancelled");

    let err = DispatchError::from(VcsError::NoBackend("/tmp/empty".into()));
    insta::assert_snapshot!(err.to_string(), @"no backend for directory '/tmp/empty'");
}
