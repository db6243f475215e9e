//! Portable snapshot file format
//!
//! A backup exported to disk is a pretty-printed JSON document with
//! camelCase keys:
//! - `id`, `tableName`, `tableId`
//! - `timestamp` (RFC 3339), `description`, `version`
//! - `rowCount`, `columns`, `rows`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::file_safe;
use crate::error::{VaultError, VaultResult};
use crate::models::{Backup, BackupId, Row, TableId, SNAPSHOT_VERSION};

/// On-disk representation of a single backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BackupId>,
    pub table_name: String,
    pub table_id: TableId,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    pub version: String,
    pub row_count: usize,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl SnapshotFile {
    /// Serialize to pretty JSON bytes
    pub fn to_bytes(&self) -> VaultResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| VaultError::Export(format!("Failed to serialize snapshot: {}", e)))
    }

    /// Parse a snapshot file
    pub fn from_bytes(bytes: &[u8]) -> VaultResult<Self> {
        let snapshot: SnapshotFile = serde_json::from_slice(bytes)
            .map_err(|e| VaultError::Json(format!("Failed to parse snapshot file: {}", e)))?;

        if !snapshot.version.starts_with("1.") {
            return Err(VaultError::Validation(format!(
                "Unsupported snapshot version: {}",
                snapshot.version
            )));
        }

        if snapshot.row_count != snapshot.rows.len() {
            return Err(VaultError::Validation(format!(
                "Snapshot declares {} rows but contains {}",
                snapshot.row_count,
                snapshot.rows.len()
            )));
        }

        Ok(snapshot)
    }

    /// Turn an imported snapshot into a new backup record with a fresh id
    pub fn into_backup(self) -> Backup {
        Backup {
            id: BackupId::new(),
            table_id: self.table_id,
            table_name: self.table_name,
            timestamp: self.timestamp,
            description: self.description,
            version: self.version,
            row_count: self.row_count,
            columns: self.columns,
            rows: self.rows,
        }
    }
}

impl From<&Backup> for SnapshotFile {
    fn from(backup: &Backup) -> Self {
        Self {
            id: Some(backup.id),
            table_name: backup.table_name.clone(),
            table_id: backup.table_id,
            timestamp: backup.timestamp,
            description: backup.description.clone(),
            version: if backup.version.is_empty() {
                SNAPSHOT_VERSION.to_string()
            } else {
                backup.version.clone()
            },
            row_count: backup.row_count,
            columns: backup.columns.clone(),
            rows: backup.rows.clone(),
        }
    }
}

/// File name for an exported backup: `backup_<tableName>_<YYYY-MM-DD>.json`
///
/// The date is the capture date of the backup.
pub fn snapshot_file_name(backup: &Backup) -> String {
    format!(
        "backup_{}_{}.json",
        file_safe(&backup.table_name),
        backup.timestamp.format("%Y-%m-%d")
    )
}
