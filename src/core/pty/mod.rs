// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pseudo-terminal sessions and the interactive prompt-auth state machine.
//!
//! ```text
//!  PtySession::spawn(&ProcessBuilder)
//!     master ◄──── child (slave dropped after spawn)
//!       │
//!   reader thread ──► flume::Receiver<Vec<u8>> ──► expect(pattern, timeout)
//!
//!  PromptAuth::drive(&mut impl Terminal)
//!
//!   AwaitUsernamePrompt ──match──► send user ──► AwaitPasswordPrompt
//!        │ eof: exit 0 => Success                   │ match: send password
//!        │ eof: exit N => Failed(Exited)            │ eof/timeout => Failed
//!        │ timeout      => Failed(Timeout)          ▼
//!                                              AwaitExit
//!                                   exit 0 => Success
//!                                   denied => Denied
//!                                   else   => Failed
//! ```

mod session;

use std::fmt;
use std::time::Duration;

use bon::Builder;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::ProcessError;

pub use session::PtySession;

/// Result of waiting for terminal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
    /// The pattern matched; holds the matched text.
    Matched(String),
    /// The child closed the terminal.
    Eof,
    /// Nothing matched before the deadline.
    Timeout,
}

/// A child process attached to a terminal.
pub trait Terminal {
    /// Waits for `pattern` in the output, or for end of output when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the terminal fails.
    fn expect(&mut self, pattern: Option<&Regex>, timeout: Duration)
    -> Result<Expect, ProcessError>;

    /// Writes `line` followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the terminal fails.
    fn send_line(&mut self, line: &str) -> Result<(), ProcessError>;

    /// Reaps the child and returns its exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting on the child fails.
    fn wait(&mut self) -> Result<i32, ProcessError>;

    /// Everything the child has written so far.
    fn transcript(&self) -> &str;
}

/// Phases of the prompt-auth state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    AwaitUsernamePrompt,
    AwaitPasswordPrompt,
    AwaitExit,
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AwaitUsernamePrompt => "waiting for username prompt",
            Self::AwaitPasswordPrompt => "waiting for password prompt",
            Self::AwaitExit => "waiting for exit",
        })
    }
}

/// Why a prompt-auth session failed without a credential rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    Exited(i32),
    Timeout,
    UnexpectedEof,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with code {code}"),
            Self::Timeout => f.write_str("timed out"),
            Self::UnexpectedEof => f.write_str("closed the terminal unexpectedly"),
        }
    }
}

/// Final state of a prompt-auth session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    /// The remote rejected the credentials.
    Denied { transcript: String },
    Failed {
        phase: AuthPhase,
        reason: AuthFailure,
        transcript: String,
    },
}

/// Prompt patterns and timeout for one interactive authentication.
#[derive(Debug, Clone, Builder)]
pub struct PromptAuth {
    username_prompt: Regex,
    password_prompt: Regex,
    /// Matched against the transcript after a failed exit.
    denied: Regex,
    #[builder(default = Duration::from_secs(10))]
    timeout: Duration,
}

impl PromptAuth {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs the state machine to completion.
    ///
    /// # Errors
    ///
    /// Returns an error only for terminal I/O failures; every protocol result
    /// is an [`AuthOutcome`].
    pub fn drive<T: Terminal>(
        &self,
        terminal: &mut T,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, ProcessError> {
        let mut phase = AuthPhase::AwaitUsernamePrompt;
        loop {
            trace!(%phase, "prompt auth");
            phase = match phase {
                AuthPhase::AwaitUsernamePrompt => {
                    match terminal.expect(Some(&self.username_prompt), self.timeout)? {
                        Expect::Matched(_) => {
                            terminal.send_line(username)?;
                            AuthPhase::AwaitPasswordPrompt
                        }
                        Expect::Eof => {
                            let code = terminal.wait()?;
                            debug!(code, "exited without prompting");
                            return Ok(if code == 0 {
                                AuthOutcome::Success
                            } else {
                                failed(terminal, phase, AuthFailure::Exited(code))
                            });
                        }
                        Expect::Timeout => {
                            return Ok(failed(terminal, phase, AuthFailure::Timeout));
                        }
                    }
                }
                AuthPhase::AwaitPasswordPrompt => {
                    match terminal.expect(Some(&self.password_prompt), self.timeout)? {
                        Expect::Matched(_) => {
                            terminal.send_line(password)?;
                            AuthPhase::AwaitExit
                        }
                        Expect::Eof => {
                            terminal.wait()?;
                            return Ok(failed(terminal, phase, AuthFailure::UnexpectedEof));
                        }
                        Expect::Timeout => {
                            return Ok(failed(terminal, phase, AuthFailure::Timeout));
                        }
                    }
                }
                AuthPhase::AwaitExit => {
                    return match terminal.expect(None, self.timeout)? {
                        Expect::Timeout => Ok(failed(terminal, phase, AuthFailure::Timeout)),
                        Expect::Eof | Expect::Matched(_) => {
                            let code = terminal.wait()?;
                            if code == 0 {
                                Ok(AuthOutcome::Success)
                            } else if self.denied.is_match(terminal.transcript()) {
                                Ok(AuthOutcome::Denied {
                                    transcript: terminal.transcript().to_string(),
                                })
                            } else {
                                Ok(failed(terminal, phase, AuthFailure::Exited(code)))
                            }
                        }
                    };
                }
            };
        }
    }
}

fn failed<T: Terminal>(terminal: &T, phase: AuthPhase, reason: AuthFailure) -> AuthOutcome {
    AuthOutcome::Failed {
        phase,
        reason,
        transcript: terminal.transcript().to_string(),
    }
}
