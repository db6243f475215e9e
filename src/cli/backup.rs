//! Backup CLI commands
//!
//! Implements CLI commands for backup management and the auto-backup
//! scheduler.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;

use crate::backup::{interval_hours, schedule_auto_backup};
use crate::display::{format_backup_details, format_backup_list};
use crate::error::{VaultError, VaultResult};
use crate::models::Backup;
use crate::services::{BackupService, TableService};
use crate::storage::Storage;

use super::table::require;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Snapshot a table
    Create {
        /// Table name or ID
        table: String,
        /// Free-text label for the backup
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List backups, newest first
    List {
        /// Only show backups of this table name
        #[arg(short, long)]
        table: Option<String>,
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Restore a backup into its table
    Restore {
        /// Backup ID
        backup: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a backup
    Delete {
        /// Backup ID
        backup: String,
    },

    /// Export a backup as a JSON snapshot file
    Export {
        /// Backup ID
        backup: String,
        /// Output directory (defaults to the exports directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a JSON snapshot file as a new backup
    Import {
        /// Path to the snapshot file
        file: PathBuf,
    },

    /// Delete old backups of a table according to the retention policy
    Prune {
        /// Table name or ID
        table: String,
    },

    /// Back up a table periodically until interrupted
    Schedule {
        /// Table name or ID
        table: String,
        /// Hours between backups (defaults to the configured interval)
        #[arg(short, long)]
        interval_hours: Option<u64>,
    },
}

/// Handle a backup command
pub async fn handle_backup_command(storage: Arc<Storage>, cmd: BackupCommands) -> VaultResult<()> {
    let service = BackupService::new(&storage);
    let tables = TableService::new(&storage);

    match cmd {
        BackupCommands::Create { table, description } => {
            let table = require(&tables, &table)?;
            let id = service.create(table.id, &description)?;
            println!("Backup created: {} ({} rows of '{}')", id, table.row_count, table.name);
        }

        BackupCommands::List { table, verbose } => {
            let backups = service.list(table.as_deref())?;

            if backups.is_empty() {
                println!("No backups found.");
                println!("Create one with: tablevault backup create <table>");
                return Ok(());
            }

            if verbose {
                for backup in &backups {
                    println!("{}", format_backup_details(backup));
                }
            } else {
                print!("{}", format_backup_list(&backups));
            }
        }

        BackupCommands::Restore { backup, force } => {
            let backup = require_backup(&service, &backup)?;
            print!("{}", format_backup_details(&backup));
            println!();

            if !force {
                if tables.get_by_name(&backup.table_name)?.is_some() {
                    println!(
                        "WARNING: This will overwrite the current contents of '{}'!",
                        backup.table_name
                    );
                } else {
                    println!("Table '{}' will be recreated.", backup.table_name);
                }
                println!("To proceed, run again with --force flag:");
                println!("  tablevault backup restore {} --force", backup.id);
                return Ok(());
            }

            let table_id = service.restore(backup.id)?;
            println!(
                "Restored '{}' ({}) with {} row(s)",
                backup.table_name, table_id, backup.row_count
            );
        }

        BackupCommands::Delete { backup } => {
            let backup = require_backup(&service, &backup)?;
            service.delete(backup.id)?;
            println!("Deleted backup {} of '{}'", backup.id, backup.table_name);
        }

        BackupCommands::Export { backup, output } => {
            let backup = require_backup(&service, &backup)?;
            let dir = output.unwrap_or_else(|| storage.paths().export_dir());
            let path = service.export_to_dir(backup.id, &dir)?;
            println!("Exported backup to {}", path.display());
        }

        BackupCommands::Import { file } => {
            let bytes = std::fs::read(&file)?;
            let id = service.import_from_file(&bytes)?;
            println!("Imported backup {} from {}", id, file.display());
        }

        BackupCommands::Prune { table } => {
            let table = require(&tables, &table)?;
            let removed = service.prune(table.id)?;
            println!(
                "Removed {} old backup(s) of '{}' (keeping {})",
                removed.len(),
                table.name,
                storage.retention().keep_per_table
            );
        }

        BackupCommands::Schedule {
            table,
            interval_hours: hours,
        } => {
            let table = require(&tables, &table)?;
            let hours = hours.unwrap_or(storage.settings().auto_backup.interval_hours);

            schedule_auto_backup(Arc::clone(&storage), table.id, interval_hours(hours)).await?;
            println!(
                "Auto-backup of '{}' every {} hour(s). Press Ctrl-C to stop.",
                table.name, hours
            );

            tokio::signal::ctrl_c().await?;
            storage.shutdown();
            println!("Auto-backup stopped.");
        }
    }

    Ok(())
}

fn require_backup(service: &BackupService<'_>, identifier: &str) -> VaultResult<Backup> {
    service
        .find(identifier)?
        .ok_or_else(|| VaultError::backup_not_found(identifier))
}
