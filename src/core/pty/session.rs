// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! A child process attached to a native pseudo-terminal.

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use regex::Regex;
use tracing::{debug, trace, warn};

use super::{Expect, Terminal};
use crate::core::process::builder::ProcessBuilder;
use crate::error::ProcessError;

/// Reader chunks buffered between the reader thread and `expect`.
const CHANNEL_CAPACITY: usize = 64;

/// How long `wait` keeps collecting trailing output after the child exits.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// A spawned child whose stdin/stdout/stderr are one pseudo-terminal.
pub struct PtySession {
    command: String,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    output: Receiver<Vec<u8>>,
    /// Output not yet consumed by a match.
    pending: String,
    transcript: String,
    eof: bool,
    exit_code: Option<i32>,
    // Dropping the master closes the terminal; keep it for the session.
    _master: Box<dyn MasterPty + Send>,
}

impl std::fmt::Debug for PtySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtySession")
            .field("command", &self.command)
            .field("eof", &self.eof)
            .field("exit_code", &self.exit_code)
            .finish_non_exhaustive()
    }
}

impl PtySession {
    /// Spawns `builder`'s command on a fresh pseudo-terminal.
    ///
    /// Flags on the builder are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::Terminal` if the terminal cannot be opened and
    /// `ProcessError::SpawnFailed` if the child cannot be started.
    pub fn spawn(builder: &ProcessBuilder) -> Result<Self, ProcessError> {
        let command = builder.command_line();
        let terminal_error = |err: &dyn std::fmt::Display| ProcessError::Terminal {
            command: command.clone(),
            message: err.to_string(),
        };

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: 24,
                cols: 200,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| terminal_error(&err))?;

        let mut cmd = CommandBuilder::new(builder.program());
        cmd.args(builder.args_slice());
        if let Some(cwd) = builder.working_dir() {
            debug!(cwd = %cwd.display(), "cd");
            cmd.cwd(cwd);
        }
        for (key, value) in builder.env_overrides() {
            match value {
                Some(value) => cmd.env(key, value),
                None => cmd.env_remove(key),
            }
        }

        debug!(cmd = %command, "exec (pty)");
        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|err| ProcessError::SpawnFailed {
                command: command.clone(),
                source: std::io::Error::other(err.to_string()),
            })?;
        // Keep only the child's handle on the slave so EOF reaches the reader.
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|err| terminal_error(&err))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|err| terminal_error(&err))?;

        let (tx, rx) = flume::bounded(CHANNEL_CAPACITY);
        thread::Builder::new()
            .name("vcal-pty-reader".to_string())
            .spawn(move || {
                let mut buf = [0u8; 4096];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if tx.send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                    }
                }
            })
            .map_err(|source| ProcessError::SpawnFailed {
                command: command.clone(),
                source,
            })?;

        Ok(Self {
            command,
            child,
            writer,
            output: rx,
            pending: String::new(),
            transcript: String::new(),
            eof: false,
            exit_code: None,
            _master: pair.master,
        })
    }

    fn push_chunk(&mut self, chunk: &[u8]) {
        let text = String::from_utf8_lossy(chunk);
        trace!(command = %self.command, output = %text, "pty read");
        self.pending.push_str(&text);
        self.transcript.push_str(&text);
    }

    fn take_match(&mut self, pattern: &Regex) -> Option<String> {
        let found = pattern.find(&self.pending)?;
        let (matched, end) = (found.as_str().to_string(), found.end());
        self.pending.drain(..end);
        Some(matched)
    }
}

impl Terminal for PtySession {
    fn expect(
        &mut self,
        pattern: Option<&Regex>,
        timeout: Duration,
    ) -> Result<Expect, ProcessError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(matched) = pattern.and_then(|p| self.take_match(p)) {
                return Ok(Expect::Matched(matched));
            }
            if self.eof {
                return Ok(Expect::Eof);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(Expect::Timeout);
            }
            match self.output.recv_timeout(remaining) {
                Ok(chunk) => self.push_chunk(&chunk),
                Err(RecvTimeoutError::Timeout) => return Ok(Expect::Timeout),
                Err(RecvTimeoutError::Disconnected) => self.eof = true,
            }
        }
    }

    fn send_line(&mut self, line: &str) -> Result<(), ProcessError> {
        let io_error = |source| ProcessError::SpawnFailed {
            command: self.command.clone(),
            source,
        };
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .map_err(io_error)?;
        self.writer.flush().map_err(io_error)
    }

    fn wait(&mut self) -> Result<i32, ProcessError> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }
        let status = self
            .child
            .wait()
            .map_err(|source| ProcessError::SpawnFailed {
                command: self.command.clone(),
                source,
            })?;
        let code = i32::try_from(status.exit_code()).unwrap_or(i32::MAX);
        self.exit_code = Some(code);

        // collect whatever the child wrote right before exiting
        while !self.eof {
            match self.output.recv_timeout(DRAIN_GRACE) {
                Ok(chunk) => self.push_chunk(&chunk),
                Err(RecvTimeoutError::Disconnected) => self.eof = true,
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
        debug!(command = %self.command, code, "pty child exited");
        Ok(code)
    }

    fn transcript(&self) -> &str {
        &self.transcript
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        if self.exit_code.is_some() {
            return;
        }
        if let Ok(None) = self.child.try_wait() {
            warn!(command = %self.command, "killing unfinished pty child");
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
