// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Minimal Mercurial driver: repository detection and the current branch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::backend::{Backend, Driver};
use crate::core::process::builder::{ProcessBuilder, ProcessFlags};
use crate::error::{BackendUnavailable, PropertyError, VcsResult};
use crate::feature::{Capability, Property, PropertyOp};

pub const DRIVER_NAME: &str = "hg";
pub const VCS_NAME: &str = "mercurial";

const CAPABILITIES: Capability = Capability::BRANCH_GET;

fn hg_command<I, S>(program: &Path, cwd: &Path, args: I) -> ProcessBuilder
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    ProcessBuilder::new(program)
        .args(args)
        .cwd(cwd)
        .env("HGPLAIN", "1")
        .flag(ProcessFlags::ALLOW_FAILURE | ProcessFlags::QUIET_FAILURE)
}

/// Factory for [`HgBackend`].
#[derive(Debug, Clone, Default)]
pub struct HgDriver {
    program: Option<PathBuf>,
}

impl HgDriver {
    /// Uses `program` instead of looking `hg` up in `PATH`.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    fn locate(&self, directory: &Path) -> VcsResult<PathBuf> {
        let found = match &self.program {
            Some(program) => program.is_file().then(|| program.clone()),
            None => ProcessBuilder::find("hg"),
        };
        found.ok_or_else(|| {
            BackendUnavailable::builder()
                .directory(directory)
                .driver(DRIVER_NAME)
                .programs(vec!["hg".to_string()])
                .message("hg executable not found")
                .build()
                .into()
        })
    }
}

impl Driver for HgDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn vcs_name(&self) -> &'static str {
        VCS_NAME
    }

    fn capabilities(&self) -> Capability {
        CAPABILITIES
    }

    fn open(&self, path: &Path) -> VcsResult<Arc<dyn Backend>> {
        let program = self.locate(path)?;
        let unavailable = |raw: &str| {
            BackendUnavailable::builder()
                .directory(path)
                .driver(DRIVER_NAME)
                .is_valid_repository(false)
                .message("not a mercurial repository")
                .raw(raw)
                .build()
        };
        if !path.is_dir() {
            return Err(unavailable("not a directory").into());
        }
        let output = hg_command(&program, path, ["root"]).run()?;
        let root = output.stdout_trimmed();
        if !output.success() || root.is_empty() {
            return Err(unavailable(output.diagnostic()).into());
        }
        debug!(repodir = root, "opened mercurial repository");
        Ok(Arc::new(HgBackend {
            program,
            repodir: PathBuf::from(root),
        }))
    }
}

/// An open Mercurial repository.
#[derive(Debug)]
pub struct HgBackend {
    program: PathBuf,
    repodir: PathBuf,
}

impl Backend for HgBackend {
    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn vcs_name(&self) -> &'static str {
        VCS_NAME
    }

    fn repodir(&self) -> &Path {
        &self.repodir
    }

    fn capabilities(&self) -> Capability {
        CAPABILITIES
    }

    fn branch(&self) -> VcsResult<String> {
        let output = hg_command(&self.program, &self.repodir, ["branch"]).run()?;
        let name = output.stdout_trimmed();
        if output.success() && !name.is_empty() {
            Ok(name.to_string())
        } else {
            Err(
                PropertyError::new(Property::Branch, PropertyOp::Get, "hg branch failed")
                    .with_raw(output.diagnostic())
                    .into(),
            )
        }
    }
}
