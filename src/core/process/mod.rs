// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Blocking process spawning.
//!
//! ```text
//! ProcessBuilder::new(program)
//!   .args() .cwd() .env() .env_remove()
//!   .run()
//!       --> std::process::Command
//!           pipes drained, child reaped before return
//!       --> ProcessOutput { exit_code, stdout, stderr }
//! ```

pub mod builder;
mod runner;
