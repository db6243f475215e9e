//! Backup service
//!
//! Creates, lists, restores and deletes table snapshots, applies the
//! retention policy, and moves snapshots in and out of files.

use std::path::{Path, PathBuf};

use crate::backup::{snapshot_file_name, RetentionPolicy, SnapshotFile};
use crate::error::{VaultError, VaultResult};
use crate::models::{Backup, BackupId, TableId};
use crate::storage::{write_bytes_atomic, Storage};

use super::table::TableService;

/// Description given to backups taken by the scheduler
pub const AUTO_BACKUP_DESCRIPTION: &str = "Auto-backup";

const RESTORE_ATTEMPTS: usize = 3;

/// Result of one auto-backup cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoBackupOutcome {
    /// The backup that was taken
    pub backup_id: BackupId,
    /// Number of older backups removed by retention
    pub pruned: usize,
}

/// Service for backup management
pub struct BackupService<'a> {
    storage: &'a Storage,
}

impl<'a> BackupService<'a> {
    /// Create a new backup service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Snapshot a table
    pub fn create(&self, table_id: TableId, description: &str) -> VaultResult<BackupId> {
        let backup = self
            .storage
            .locks
            .run_exclusive(table_id, || self.capture(table_id, description))?;

        tracing::info!(
            table = %backup.table_name,
            backup_id = %backup.id,
            rows = backup.row_count,
            "Created backup"
        );
        Ok(backup.id)
    }

    /// List backups, newest first, optionally for one table name
    pub fn list(&self, table_name: Option<&str>) -> VaultResult<Vec<Backup>> {
        match table_name {
            Some(name) => self.storage.backups.get_by_table_name(name),
            None => self.storage.backups.get_all(),
        }
    }

    /// Get a backup by ID
    pub fn get(&self, id: BackupId) -> VaultResult<Option<Backup>> {
        self.storage.backups.get(id)
    }

    /// Find a backup by full or short ID
    pub fn find(&self, identifier: &str) -> VaultResult<Option<Backup>> {
        if let Ok(id) = identifier.parse::<BackupId>() {
            return self.storage.backups.get(id);
        }

        let mut matches = self
            .storage
            .backups
            .get_all()?
            .into_iter()
            .filter(|b| b.id.matches(identifier));

        match (matches.next(), matches.next()) {
            (Some(backup), None) => Ok(Some(backup)),
            _ => Ok(None),
        }
    }

    /// Restore a backup into the live table of the same name
    ///
    /// An existing table keeps its ID and creation time and gets the
    /// snapshot's columns and rows. If no table has that name, a new one is
    /// created.
    pub fn restore(&self, backup_id: BackupId) -> VaultResult<TableId> {
        let backup = self.require(backup_id)?;
        let target = self
            .storage
            .tables
            .get_by_name(&backup.table_name)?
            .map(|t| t.id);
        let table_id = self.restore_into(target, &backup)?;

        tracing::info!(
            table = %backup.table_name,
            backup_id = %backup_id,
            table_id = %table_id,
            "Restored backup"
        );
        Ok(table_id)
    }

    /// Delete a backup
    pub fn delete(&self, id: BackupId) -> VaultResult<Backup> {
        let removed = self.storage.backups.remove(id)?;
        tracing::info!(backup_id = %id, table = %removed.table_name, "Deleted backup");
        Ok(removed)
    }

    /// Render a backup as a snapshot file
    pub fn export_to_file(&self, id: BackupId) -> VaultResult<Vec<u8>> {
        let backup = self.require(id)?;
        SnapshotFile::from(&backup).to_bytes()
    }

    /// File name to export a backup under
    pub fn export_file_name(&self, backup: &Backup) -> String {
        snapshot_file_name(backup)
    }

    /// Write a snapshot file into `dir`, returning its path
    pub fn export_to_dir(&self, id: BackupId, dir: &Path) -> VaultResult<PathBuf> {
        let backup = self.require(id)?;
        let bytes = SnapshotFile::from(&backup).to_bytes()?;

        std::fs::create_dir_all(dir).map_err(|e| {
            VaultError::Export(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        let path = dir.join(snapshot_file_name(&backup));
        write_bytes_atomic(&path, &bytes)?;

        tracing::info!(backup_id = %id, path = %path.display(), "Exported backup");
        Ok(path)
    }

    /// Store a snapshot file as a new backup
    pub fn import_from_file(&self, bytes: &[u8]) -> VaultResult<BackupId> {
        let backup = SnapshotFile::from_bytes(bytes)?.into_backup();
        let stored = self.storage.backups.insert_imported(backup)?;

        tracing::info!(
            backup_id = %stored.id,
            table = %stored.table_name,
            "Imported backup"
        );
        Ok(stored.id)
    }

    /// Apply the retention policy to one table's backups
    pub fn prune(&self, table_id: TableId) -> VaultResult<Vec<BackupId>> {
        self.storage
            .locks
            .run_exclusive(table_id, || self.prune_unlocked(table_id))
    }

    /// One auto-backup cycle: snapshot, then prune
    pub fn auto_backup(&self, table_id: TableId) -> VaultResult<AutoBackupOutcome> {
        self.storage.locks.run_exclusive(table_id, || {
            let backup = self.capture(table_id, AUTO_BACKUP_DESCRIPTION)?;
            let pruned = self.prune_unlocked(table_id)?;
            Ok(AutoBackupOutcome {
                backup_id: backup.id,
                pruned: pruned.len(),
            })
        })
    }

    // A concurrent create or delete of the same name makes `target` stale,
    // so the name is looked up again and the write retried
    fn restore_into(&self, mut target: Option<TableId>, backup: &Backup) -> VaultResult<TableId> {
        let tables = TableService::new(self.storage);
        let mut attempt = 1;

        loop {
            let columns = backup.columns.clone();
            let rows = backup.rows.clone();
            let result = match target {
                Some(id) => tables.replace_contents(id, columns, rows),
                None => tables.create(&backup.table_name, columns, rows),
            };

            let stale = match &result {
                Err(e) if target.is_none() => e.is_duplicate(),
                Err(e) => e.is_not_found(),
                Ok(_) => false,
            };
            if !stale || attempt == RESTORE_ATTEMPTS {
                return result;
            }

            tracing::debug!(
                table = %backup.table_name,
                attempt,
                "Restore target changed, retrying"
            );
            target = self
                .storage
                .tables
                .get_by_name(&backup.table_name)?
                .map(|t| t.id);
            attempt += 1;
        }
    }

    fn require(&self, id: BackupId) -> VaultResult<Backup> {
        self.storage
            .backups
            .get(id)?
            .ok_or_else(|| VaultError::backup_not_found(id.to_string()))
    }

    // Caller must hold the table's lock
    fn capture(&self, table_id: TableId, description: &str) -> VaultResult<Backup> {
        let table = self
            .storage
            .tables
            .get(table_id)?
            .ok_or_else(|| VaultError::table_not_found(table_id.to_string()))?;

        self.storage.backups.insert(Backup::capture(&table, description))
    }

    // Caller must hold the table's lock
    fn prune_unlocked(&self, table_id: TableId) -> VaultResult<Vec<BackupId>> {
        let policy = RetentionPolicy::from(self.storage.retention());
        let backups = self.storage.backups.get_by_table_id(table_id)?;
        let expired = policy.expired(&backups);

        if !expired.is_empty() {
            self.storage.backups.remove_many(&expired)?;
            tracing::warn!(
                table_id = %table_id,
                removed = expired.len(),
                kept = policy.keep(),
                "Pruned old backups"
            );
        }

        Ok(expired)
    }
}
