// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Informational commands: options, configs, features, version.

use crate::backend::Backend;
use crate::config::Config;
use crate::feature::{Operation, score};

/// Display current configuration options.
pub fn run_options_command(config: &Config) {
    for line in config.format_options() {
        println!("{line}");
    }
}

/// Display loaded configuration files.
pub fn run_configs_command(config_files: &[String]) {
    if config_files.is_empty() {
        println!("No configuration files loaded");
    } else {
        for line in config_files {
            println!("{line}");
        }
    }
}

/// Driver header followed by one line per operation.
///
/// ```text
/// git (git) score 31 at /work/repo
/// commit        enabled
/// branch.del    disabled
/// ```
#[must_use]
pub fn format_features(backend: &dyn Backend) -> Vec<String> {
    let operations = Operation::all();
    let width = operations
        .iter()
        .map(|op| op.to_string().len())
        .max()
        .unwrap_or(0);

    let mut lines = vec![format!(
        "{} ({}) score {} at {}",
        backend.driver_name(),
        backend.vcs_name(),
        score(backend.capabilities()),
        backend.repodir().display()
    )];
    for op in operations {
        let feature = backend.feature(op);
        let state = if feature.enabled { "enabled" } else { "disabled" };
        let mut line = format!("{:<width$} {state}", feature.name());
        if !feature.extra.is_empty()
            && let Ok(extra) = serde_json::to_string(&feature.extra)
        {
            line.push(' ');
            line.push_str(&extra);
        }
        lines.push(line);
    }
    lines
}

/// Display the operations the selected driver supports.
pub fn run_features_command(backend: &dyn Backend) {
    for line in format_features(backend) {
        println!("{line}");
    }
}

/// Display the crate version.
pub fn run_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}
