// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `task-manager serve`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use task_manager_core::domain::config::AppConfig;

use crate::server::start_server;

#[derive(Args)]
pub struct ServeCommand {
    /// HTTP bind address (overrides configuration)
    #[arg(long)]
    pub host: Option<String>,

    /// HTTP port (overrides configuration)
    #[arg(long)]
    pub port: Option<u16>,

    /// Do not apply pending migrations on startup
    #[arg(long)]
    pub skip_migrations: bool,
}

/// Effective configuration: file and environment, then command-line flags
pub fn resolve_config(cmd: &ServeCommand, config_path: Option<PathBuf>) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(config_path).context("Failed to load configuration")?;
    if let Some(host) = &cmd.host {
        config.server.bind_address = host.clone();
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

pub async fn execute(cmd: ServeCommand, config_path: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(&cmd, config_path)?;
    println!(
        "{} {}",
        "Task manager".bold().green(),
        format!("http://{}", config.listen_address()).cyan()
    );
    start_server(config, !cmd.skip_migrations).await
}
