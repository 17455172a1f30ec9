// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |                     |
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |          config           |
//!              |   TOML, layered settings  |
//!              '--+-----------+--------+---'
//!                 |           |        |
//!                 v           v        v
//!             manager    dispatcher  credentials
//!           rank, open   workers +   keyring or
//!            create      auth retry   memory
//!                 |
//!                 v
//!              backend  (Driver / Backend traits)
//!            +----+----+
//!            v         v
//!           git        hg
//!
//!   +-------------------------------------------+
//!   |  core     process runner, pty sessions    |
//!   +-------------------------------------------+
//!   |  model    feature, change                 |
//!   +-------------------------------------------+
//!   |  foundation   error, logging              |
//!   +-------------------------------------------+
//! ```

pub mod backend;
pub mod change;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod core;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod feature;
pub mod logging;
pub mod manager;
