// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Terminal credential prompt.

use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use tracing::debug;

use crate::credentials::{CredentialKey, Credentials};
use crate::dispatcher::{CredentialPrompt, CredentialRequest};

/// Asks for each required key on the terminal; secrets are masked.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn ask(key: CredentialKey, known: Option<&str>) -> Result<String, InquireError> {
        let label = format!("{}:", capitalize(key.as_str()));
        if key.is_secret() {
            Password::new(&label)
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked)
                .prompt()
        } else {
            let mut text = Text::new(&label);
            if let Some(known) = known {
                text = text.with_default(known);
            }
            text.prompt()
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl CredentialPrompt for TerminalPrompt {
    fn prompt(&self, request: &CredentialRequest) -> Option<Credentials> {
        eprintln!("{}", request.message);
        let mut credentials = Credentials::default();
        for key in &request.required {
            match Self::ask(*key, request.credentials.get(*key)) {
                Ok(value) => credentials.insert(*key, Some(value)),
                Err(e) => {
                    debug!(key = key.as_str(), error = %e, "credential prompt aborted");
                    return None;
                }
            }
        }
        Some(credentials)
    }
}

