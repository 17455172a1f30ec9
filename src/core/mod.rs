// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core modules for running VCS executables.
//!
//! ```text
//!              core
//!               |
//!       +-------+-------+
//!       |               |
//!       v               v
//!    process           pty
//!       |               |
//!    Builder       PtySession
//!    Output        PromptAuth state machine
//! ```

pub mod process;
pub mod pty;
