// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Blocking process execution.
//!
//! ```text
//! run()
//!   |
//!   v
//! build_command()   args, cwd, env overrides, stdio
//!   |
//!   v
//! spawn ──► wait_with_output()
//!           (both pipes drained, child reaped)
//!   |
//!   v
//! validate exit_code (skip if ALLOW_FAILURE)
//!   |
//!   v
//! ProcessOutput { exit_code, stdout, stderr }
//! ```

use std::process::{Command, Stdio};

use tracing::{debug, error, trace};

use super::builder::{ProcessBuilder, ProcessFlags, ProcessOutput};
use crate::error::ProcessError;

impl ProcessBuilder {
    /// Spawns the process and waits for completion.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Spawning the child process fails.
    /// - The process exits with a non-zero status (and `ALLOW_FAILURE` flag is not set).
    pub fn run(&self) -> Result<ProcessOutput, ProcessError> {
        let name = self.display_name();
        let cmd_line = self.command_line();

        if let Some(cwd) = self.working_dir() {
            debug!(cwd = %cwd.display(), "cd");
        }
        debug!(cmd = %cmd_line, "exec");

        let spawn_failed = |source| ProcessError::SpawnFailed {
            command: cmd_line.clone(),
            source,
        };

        let child = self.build_command().spawn().map_err(spawn_failed)?;
        trace!(process = %name, pid = child.id(), "spawned");

        let output = child.wait_with_output().map_err(spawn_failed)?;
        let output = ProcessOutput::new(
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        );

        let flags = self.process_flags();
        if !output.success() && !flags.contains(ProcessFlags::ALLOW_FAILURE) {
            if !flags.contains(ProcessFlags::QUIET_FAILURE) && !output.stderr().is_empty() {
                error!(process = %name, stderr = %output.stderr(), "process error output");
            }
            return Err(ProcessError::NonZeroExit {
                command: cmd_line,
                code: output.exit_code(),
                stderr: output.stderr().to_string(),
            });
        }

        trace!(process = %name, exit_code = output.exit_code(), "completed");
        Ok(output)
    }

    /// Builds the std Command from this builder's configuration.
    fn build_command(&self) -> Command {
        let mut command = Command::new(self.program());
        command.args(self.args_slice());

        if let Some(cwd) = self.working_dir() {
            command.current_dir(cwd);
        }

        for (key, value) in self.env_overrides() {
            match value {
                Some(value) => command.env(key, value),
                None => command.env_remove(key),
            };
        }

        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command
    }
}
