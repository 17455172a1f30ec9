// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   info:   Version | Options | Configs | Features
//!   repo:   Status | Stage | Commit | Log | Undo* | Branch*
//!   remote: Fetch | Pull | Push | Init
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use vcal::backend::Backend;
use vcal::cli::global::GlobalOptions;
use vcal::cli::{self, Command};
use vcal::cmd::branch::{
    run_branch_command, run_branches_command, run_create_branch_command,
    run_delete_branch_command,
};
use vcal::cmd::config::{
    run_configs_command, run_features_command, run_options_command, run_version_command,
};
use vcal::cmd::open_repository;
use vcal::cmd::remote::{run_fetch_command, run_init_command, run_pull_command, run_push_command};
use vcal::cmd::repo::{
    run_commit_command, run_log_command, run_stage_command, run_status_command,
    run_undo_change_command, run_undo_commit_command, run_unstage_command,
};
use vcal::config::loader::ConfigLoader;
use vcal::config::{Config, ENV_PREFIX, LOCAL_CONFIG_FILE};
use vcal::error::Result;
use vcal::logging::{LogConfig, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> ExitCode {
    let cli = cli::parse();

    let loader = match build_config_loader(&cli.global) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Invalid --set override: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let config_files = loader.format_loaded_files();
    let config = match loader.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_config = build_log_config(&config);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match dispatch_command(&cli, &config, &config_files) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn build_config_loader(global: &GlobalOptions) -> Result<ConfigLoader> {
    let mut loader = ConfigLoader::new();
    if !global.no_local_config {
        loader = loader.add_toml_file_optional(LOCAL_CONFIG_FILE);
    }
    for path in &global.configs {
        loader = loader.add_toml_file(path);
    }
    loader
        .with_env_prefix(ENV_PREFIX)
        .apply_overrides(&global.to_config_overrides())
}

fn build_log_config(config: &Config) -> LogConfig {
    LogConfig::builder()
        .with_console_level(config.global.output_log_level)
        .with_file_level(config.global.file_log_level)
        .maybe_with_log_file(config.global.log_file.clone())
        .build()
}

fn open(cli: &cli::Cli, config: &Config) -> Result<Arc<dyn Backend>> {
    open_repository(config, &cli.global.repository_dir())
}

fn dispatch_command(cli: &cli::Cli, config: &Config, config_files: &[String]) -> Result<()> {
    let Some(command) = &cli.command else {
        eprintln!("No command specified. Use --help for usage information.");
        return Err(anyhow::anyhow!("No command specified"));
    };

    match command {
        Command::Version => {
            run_version_command();
            Ok(())
        }
        Command::Options => {
            run_options_command(config);
            Ok(())
        }
        Command::Configs => {
            run_configs_command(config_files);
            Ok(())
        }
        Command::Features => {
            run_features_command(open(cli, config)?.as_ref());
            Ok(())
        }
        Command::Status(args) => run_status_command(args, open(cli, config)?.as_ref()),
        Command::Branch(args) => run_branch_command(args, open(cli, config)?.as_ref()),
        Command::Branches(args) => run_branches_command(args, open(cli, config)?.as_ref()),
        Command::CreateBranch(args) => {
            run_create_branch_command(args, open(cli, config)?.as_ref())
        }
        Command::DeleteBranch(args) => {
            run_delete_branch_command(args, open(cli, config)?.as_ref())
        }
        Command::Stage(args) => run_stage_command(args, open(cli, config)?.as_ref()),
        Command::Unstage(args) => run_unstage_command(args, open(cli, config)?.as_ref()),
        Command::Commit(args) => run_commit_command(args, open(cli, config)?.as_ref()),
        Command::Log(args) => run_log_command(args, open(cli, config)?.as_ref()),
        Command::UndoCommit(args) => run_undo_commit_command(args, open(cli, config)?.as_ref()),
        Command::UndoChange(args) => run_undo_change_command(args, open(cli, config)?.as_ref()),
        Command::Fetch(args) => run_fetch_command(args, open(cli, config)?, config),
        Command::Pull => run_pull_command(open(cli, config)?, config),
        Command::Push => run_push_command(open(cli, config)?, config),
        Command::Init(args) => run_init_command(args, config),
    }
}
