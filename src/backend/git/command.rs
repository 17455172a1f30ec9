// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git invocation bound to one repository.
//!
//! ```text
//! GitRunner { program, repodir }
//!   command(args) --> ProcessBuilder (GCM_INTERACTIVE=never, GIT_TERMINAL_PROMPT=0)
//!   run(args)     --> ProcessOutput (never fails on exit code)
//! ```

use std::io;
use std::path::{Path, PathBuf};

use crate::core::process::builder::{ProcessBuilder, ProcessFlags, ProcessOutput};
use crate::error::{VcsError, VcsResult};

/// Runs git commands inside one repository root.
#[derive(Debug, Clone)]
pub struct GitRunner {
    program: PathBuf,
    repodir: PathBuf,
}

impl GitRunner {
    pub const fn new(program: PathBuf, repodir: PathBuf) -> Self {
        Self { program, repodir }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn repodir(&self) -> &Path {
        &self.repodir
    }

    /// Builder for `git <args>` with prompts disabled.
    ///
    /// Exit codes are left to the caller.
    pub fn command<I, S>(&self, args: I) -> ProcessBuilder
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        git_command(&self.program, &self.repodir, args)
    }

    /// Runs `git <args>` and returns its output whatever the exit code.
    ///
    /// # Errors
    ///
    /// `Io` when the repository disappeared; `Process` when git cannot be
    /// spawned.
    pub fn run<I, S>(&self, args: I) -> VcsResult<ProcessOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.ensure_repository()?;
        Ok(self.command(args).run()?)
    }

    /// Runs a builder made by [`Self::command`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::run`].
    pub fn run_with(&self, builder: &ProcessBuilder) -> VcsResult<ProcessOutput> {
        self.ensure_repository()?;
        Ok(builder.run()?)
    }

    /// Builder for `git <args>` that lets git prompt on its terminal.
    pub fn prompting_command<I, S>(&self, args: I) -> ProcessBuilder
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        ProcessBuilder::new(&self.program)
            .args(args)
            .cwd(&self.repodir)
            .env("GCM_INTERACTIVE", "never")
            .env_remove("GIT_ASKPASS")
            .env_remove("SSH_ASKPASS")
    }

    /// Like [`Self::run`] but only returns trimmed stdout on success.
    ///
    /// # Errors
    ///
    /// Same as [`Self::run`].
    pub fn query<I, S>(&self, args: I) -> VcsResult<Option<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let output = self.run(args)?;
        Ok(output
            .success()
            .then(|| output.stdout_trimmed().to_string()))
    }

    /// Fails when `.git` vanished from the repository root.
    ///
    /// # Errors
    ///
    /// `Io` with `NotFound`.
    pub fn ensure_repository(&self) -> VcsResult<()> {
        if self.repodir.join(".git").exists() {
            Ok(())
        } else {
            Err(VcsError::from(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is no longer a git repository", self.repodir.display()),
            )))
        }
    }
}

/// Builder for `git <args>` in `cwd` with prompts disabled.
pub fn git_command<I, S>(program: &Path, cwd: &Path, args: I) -> ProcessBuilder
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    ProcessBuilder::new(program)
        .args(args)
        .cwd(cwd)
        .env("GCM_INTERACTIVE", "never")
        .env("GIT_TERMINAL_PROMPT", "0")
        .flag(ProcessFlags::ALLOW_FAILURE | ProcessFlags::QUIET_FAILURE)
}

/// Guards a path argument that starts with `-` from being read as an option.
#[must_use]
pub fn escape_path(path: &str) -> String {
    if path.starts_with('-') {
        format!("\\{path}")
    } else {
        path.to_string()
    }
}
