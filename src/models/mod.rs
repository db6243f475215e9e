//! Core data models for tablevault
//!
//! This module contains the data structures the store persists: tables and
//! their point-in-time backups.

pub mod backup;
pub mod ids;
pub mod table;

pub use backup::{Backup, SNAPSHOT_VERSION};
pub use ids::{BackupId, TableId};
pub use table::{format_bytes, Cell, Row, Table, TablePage, TableStats, TableValidationError};
