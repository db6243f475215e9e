//! Backup repository for JSON storage
//!
//! Manages loading and saving backups to backups.json. Records are keyed by
//! id, with a non-unique index on the source table name.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};
use crate::models::{Backup, BackupId, TableId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_guard, write_guard};

/// Serializable backup collection
#[derive(Debug, Clone, Default, Deserialize)]
struct BackupData {
    backups: Vec<Backup>,
}

#[derive(Serialize)]
struct BackupDataRef<'a> {
    backups: Vec<&'a Backup>,
}

/// Repository for backup persistence
pub struct BackupRepository {
    path: PathBuf,
    data: RwLock<HashMap<BackupId, Backup>>,
    /// Index: table name -> backup ids
    by_table: RwLock<HashMap<String, Vec<BackupId>>>,
}

impl BackupRepository {
    /// Create a new backup repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_table: RwLock::new(HashMap::new()),
        }
    }

    /// Load backups from disk
    pub fn load(&self) -> VaultResult<()> {
        let file_data: BackupData = read_json(&self.path)?;

        let mut data = write_guard(&self.data)?;
        let mut by_table = write_guard(&self.by_table)?;

        data.clear();
        by_table.clear();

        for backup in file_data.backups {
            by_table
                .entry(backup.table_name.clone())
                .or_default()
                .push(backup.id);
            data.insert(backup.id, backup);
        }

        Ok(())
    }

    /// Get a backup by ID
    pub fn get(&self, id: BackupId) -> VaultResult<Option<Backup>> {
        let data = read_guard(&self.data)?;
        Ok(data.get(&id).cloned())
    }

    /// Get all backups, newest first
    pub fn get_all(&self) -> VaultResult<Vec<Backup>> {
        let data = read_guard(&self.data)?;

        let mut backups: Vec<_> = data.values().cloned().collect();
        sort_newest_first(&mut backups);
        Ok(backups)
    }

    /// Get the backups captured from tables with this name, newest first
    pub fn get_by_table_name(&self, name: &str) -> VaultResult<Vec<Backup>> {
        let data = read_guard(&self.data)?;
        let by_table = read_guard(&self.by_table)?;

        let mut backups: Vec<_> = by_table
            .get(name)
            .map(|ids| ids.iter().filter_map(|id| data.get(id)).cloned().collect())
            .unwrap_or_default();
        sort_newest_first(&mut backups);
        Ok(backups)
    }

    /// Get the backups captured from one table id, newest first
    pub fn get_by_table_id(&self, table_id: TableId) -> VaultResult<Vec<Backup>> {
        let data = read_guard(&self.data)?;

        let mut backups: Vec<_> = data
            .values()
            .filter(|b| b.table_id == table_id)
            .cloned()
            .collect();
        sort_newest_first(&mut backups);
        Ok(backups)
    }

    /// Count backups
    pub fn count(&self) -> VaultResult<usize> {
        let data = read_guard(&self.data)?;
        Ok(data.len())
    }

    /// Insert a freshly captured backup, returning the stored record
    ///
    /// Capture timestamps are kept strictly increasing: a backup whose
    /// timestamp does not come after the newest stored one is moved one
    /// microsecond past it.
    pub fn insert(&self, backup: Backup) -> VaultResult<Backup> {
        self.store(backup, |data, timestamp| {
            match data.values().map(|b| b.timestamp).max() {
                Some(latest) if timestamp <= latest => latest + Duration::microseconds(1),
                _ => timestamp,
            }
        })
    }

    /// Insert a backup brought in from outside, keeping its capture time
    ///
    /// Only an exact tie with a stored timestamp is resolved, by moving
    /// the new record forward in one microsecond steps.
    pub fn insert_imported(&self, backup: Backup) -> VaultResult<Backup> {
        self.store(backup, |data, mut timestamp| {
            while data.values().any(|b| b.timestamp == timestamp) {
                timestamp += Duration::microseconds(1);
            }
            timestamp
        })
    }

    fn store<F>(&self, mut backup: Backup, place: F) -> VaultResult<Backup>
    where
        F: FnOnce(&HashMap<BackupId, Backup>, DateTime<Utc>) -> DateTime<Utc>,
    {
        let mut data = write_guard(&self.data)?;
        let mut by_table = write_guard(&self.by_table)?;

        if data.contains_key(&backup.id) {
            return Err(VaultError::Storage(format!("Backup id collision: {}", backup.id)));
        }

        backup.timestamp = place(&data, backup.timestamp);

        let id = backup.id;
        let table_name = backup.table_name.clone();
        by_table.entry(table_name.clone()).or_default().push(id);
        data.insert(id, backup.clone());

        if let Err(e) = self.persist(&data) {
            data.remove(&id);
            unindex(&mut by_table, &table_name, id);
            return Err(e);
        }

        Ok(backup)
    }

    /// Remove a backup, returning the removed record
    pub fn remove(&self, id: BackupId) -> VaultResult<Backup> {
        let mut removed = self.remove_many(&[id])?;
        removed
            .pop()
            .ok_or_else(|| VaultError::backup_not_found(id.to_string()))
    }

    /// Remove several backups in one write
    ///
    /// Fails without removing anything if any id is unknown.
    pub fn remove_many(&self, ids: &[BackupId]) -> VaultResult<Vec<Backup>> {
        let mut data = write_guard(&self.data)?;
        let mut by_table = write_guard(&self.by_table)?;

        if let Some(missing) = ids.iter().find(|id| !data.contains_key(id)) {
            return Err(VaultError::backup_not_found(missing.to_string()));
        }

        let removed: Vec<Backup> = ids.iter().filter_map(|id| data.remove(id)).collect();
        for backup in &removed {
            unindex(&mut by_table, &backup.table_name, backup.id);
        }

        if let Err(e) = self.persist(&data) {
            for backup in removed {
                by_table
                    .entry(backup.table_name.clone())
                    .or_default()
                    .push(backup.id);
                data.insert(backup.id, backup);
            }
            return Err(e);
        }

        Ok(removed)
    }

    fn persist(&self, data: &HashMap<BackupId, Backup>) -> VaultResult<()> {
        let mut backups: Vec<&Backup> = data.values().collect();
        backups.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        write_json_atomic(&self.path, &BackupDataRef { backups })
    }
}

fn sort_newest_first(backups: &mut [Backup]) {
    backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

fn unindex(by_table: &mut HashMap<String, Vec<BackupId>>, table_name: &str, id: BackupId) {
    if let Some(ids) = by_table.get_mut(table_name) {
        ids.retain(|existing| *existing != id);
        if ids.is_empty() {
            by_table.remove(table_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Table;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, BackupRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backups.json");
        let repo = BackupRepository::new(path);
        (temp_dir, repo)
    }

    fn backup_of(name: &str) -> Backup {
        let table = Table::new(name, vec!["a".into()], vec![vec![Some("1".into())]]);
        Backup::capture(&table, "")
    }

    #[test]
    fn test_insert_and_get() {
        let (_temp_dir, repo) = create_test_repo();
        let stored = repo.insert(backup_of("orders")).unwrap();

        let loaded = repo.get(stored.id).unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let (_temp_dir, repo) = create_test_repo();
        let first = backup_of("orders");
        let mut second = backup_of("orders");
        second.timestamp = first.timestamp;

        let first = repo.insert(first).unwrap();
        let second = repo.insert(second).unwrap();
        assert!(second.timestamp > first.timestamp);
    }

    #[test]
    fn test_imported_backup_keeps_timestamp() {
        let (_temp_dir, repo) = create_test_repo();
        repo.insert(backup_of("orders")).unwrap();

        let mut old = backup_of("orders");
        old.timestamp = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let stored = repo.insert_imported(old.clone()).unwrap();
        assert_eq!(stored.timestamp, old.timestamp);

        // The imported record ranks as the oldest, not the newest
        let all = repo.get_all().unwrap();
        assert_eq!(all.last().unwrap().id, stored.id);
    }

    #[test]
    fn test_imported_backup_resolves_exact_tie() {
        let (_temp_dir, repo) = create_test_repo();
        let existing = repo.insert(backup_of("orders")).unwrap();

        let mut twin = backup_of("orders");
        twin.timestamp = existing.timestamp;
        let stored = repo.insert_imported(twin).unwrap();
        assert_eq!(
            stored.timestamp,
            existing.timestamp + Duration::microseconds(1)
        );
    }

    #[test]
    fn test_get_by_table_name_filters_and_sorts() {
        let (_temp_dir, repo) = create_test_repo();
        let a1 = repo.insert(backup_of("a")).unwrap();
        repo.insert(backup_of("b")).unwrap();
        let a2 = repo.insert(backup_of("a")).unwrap();

        let for_a = repo.get_by_table_name("a").unwrap();
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].id, a2.id);
        assert_eq!(for_a[1].id, a1.id);

        assert!(repo.get_by_table_name("missing").unwrap().is_empty());
        assert_eq!(repo.get_all().unwrap().len(), 3);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let stored = repo.insert(backup_of("orders")).unwrap();

        let repo2 = BackupRepository::new(temp_dir.path().join("backups.json"));
        repo2.load().unwrap();

        assert_eq!(repo2.get(stored.id).unwrap().unwrap(), stored);
        assert_eq!(repo2.get_by_table_name("orders").unwrap().len(), 1);
    }

    #[test]
    fn test_remove() {
        let (_temp_dir, repo) = create_test_repo();
        let stored = repo.insert(backup_of("orders")).unwrap();

        repo.remove(stored.id).unwrap();
        assert!(repo.get(stored.id).unwrap().is_none());
        assert!(repo.get_by_table_name("orders").unwrap().is_empty());
        assert!(repo.remove(stored.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_remove_many_is_all_or_nothing() {
        let (_temp_dir, repo) = create_test_repo();
        let kept = repo.insert(backup_of("orders")).unwrap();

        let err = repo.remove_many(&[kept.id, BackupId::new()]).unwrap_err();
        assert!(err.is_not_found());
        assert!(repo.get(kept.id).unwrap().is_some());
    }
}
