// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Database Migrate Command
//!
//! Applies the embedded schema migrations to the configured PostgreSQL
//! database.
//!
//! # Usage
//!
//! ```bash
//! # Apply all pending migrations
//! task-manager migrate
//!
//! # Preview migrations without applying
//! task-manager migrate --dry-run
//! ```
//!
//! # Environment
//!
//! Requires a database URL, from the config file or
//! `TASK_MANAGER_DATABASE_URL` / `DATABASE_URL`.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use task_manager_core::domain::config::AppConfig;
use task_manager_core::domain::repository::StorageBackend;
use task_manager_core::infrastructure::db::{Database, MIGRATOR};

#[derive(Args)]
pub struct MigrateCommand {
    /// Perform a dry run without applying changes
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(cmd: MigrateCommand, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "Task manager migrations".bold().green());

    let config = AppConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let pg = match config.storage_backend() {
        StorageBackend::PostgreSQL(pg) => pg,
        StorageBackend::InMemory => {
            bail!("No database configured. Set TASK_MANAGER_DATABASE_URL or database.url in the config file.")
        }
    };

    println!("Connecting to database...");
    let database = Database::new(&pg).await?;

    let applied = database.applied_migrations().await;
    let pending: Vec<_> = MIGRATOR
        .iter()
        .filter(|migration| !applied.contains(&migration.version))
        .collect();

    println!(
        "Migration status: {} applied, {} total available.",
        applied.len(),
        MIGRATOR.iter().count()
    );

    if pending.is_empty() {
        println!("{}", "✓ Database is up to date.".green());
        return Ok(());
    }

    if cmd.dry_run {
        println!("Pending migrations found (Dry Run):");
        for migration in &pending {
            println!(" - {} {}", migration.version, migration.description);
        }
        println!("Skipping application due to --dry-run");
        return Ok(());
    }

    println!("Applying {} pending migration(s)...", pending.len());
    database.run_migrations().await?;
    println!("{}", "✓ Database updated successfully.".green());

    Ok(())
}
