//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod backup;
pub mod table;

pub use backup::{handle_backup_command, BackupCommands};
pub use table::{handle_table_command, TableCommands};
