//! Backup model
//!
//! A backup is a value copy of one table's columns and rows taken at a point
//! in time. It never links back to the live table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BackupId, TableId};
use super::table::{Row, Table};

/// Snapshot format version written into every backup
pub const SNAPSHOT_VERSION: &str = "1.0";

/// A point-in-time copy of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    /// Unique identifier
    pub id: BackupId,

    /// ID of the table this was captured from
    pub table_id: TableId,

    /// Name of the table at capture time
    pub table_name: String,

    /// Capture time
    pub timestamp: DateTime<Utc>,

    /// Free-text label
    #[serde(default)]
    pub description: String,

    /// Snapshot format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Row count at capture time
    pub row_count: usize,

    /// Header labels at capture time
    #[serde(default)]
    pub columns: Vec<String>,

    /// Row data at capture time
    #[serde(default)]
    pub rows: Vec<Row>,
}

fn default_version() -> String {
    SNAPSHOT_VERSION.to_string()
}

impl Backup {
    /// Capture a snapshot of a table
    pub fn capture(table: &Table, description: impl Into<String>) -> Self {
        Self {
            id: BackupId::new(),
            table_id: table.id,
            table_name: table.name.clone(),
            timestamp: Utc::now(),
            description: description.into(),
            version: default_version(),
            row_count: table.row_count,
            columns: table.columns.clone(),
            rows: table.rows.clone(),
        }
    }
}
