//! Table repository for JSON storage
//!
//! Manages loading and saving tables to tables.json. Records are keyed by
//! id, with a unique index on the table name.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};
use crate::models::{Table, TableId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_guard, write_guard};

/// Serializable table collection
#[derive(Debug, Clone, Default, Deserialize)]
struct TableData {
    tables: Vec<Table>,
}

#[derive(Serialize)]
struct TableDataRef<'a> {
    tables: Vec<&'a Table>,
}

/// Repository for table persistence
pub struct TableRepository {
    path: PathBuf,
    data: RwLock<HashMap<TableId, Table>>,
    /// Unique index: name -> table_id
    by_name: RwLock<HashMap<String, TableId>>,
}

impl TableRepository {
    /// Create a new table repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_name: RwLock::new(HashMap::new()),
        }
    }

    /// Load tables from disk
    pub fn load(&self) -> VaultResult<()> {
        let file_data: TableData = read_json(&self.path)?;

        let mut data = write_guard(&self.data)?;
        let mut by_name = write_guard(&self.by_name)?;

        data.clear();
        by_name.clear();

        for table in file_data.tables {
            if by_name.insert(table.name.clone(), table.id).is_some() {
                return Err(VaultError::Storage(format!(
                    "Duplicate table name in {}: {}",
                    self.path.display(),
                    table.name
                )));
            }
            data.insert(table.id, table);
        }

        Ok(())
    }

    /// Get a table by ID
    pub fn get(&self, id: TableId) -> VaultResult<Option<Table>> {
        let data = read_guard(&self.data)?;
        Ok(data.get(&id).cloned())
    }

    /// Get a table by exact name
    pub fn get_by_name(&self, name: &str) -> VaultResult<Option<Table>> {
        let data = read_guard(&self.data)?;
        let by_name = read_guard(&self.by_name)?;

        Ok(by_name.get(name).and_then(|id| data.get(id)).cloned())
    }

    /// Get all tables, sorted by name
    pub fn get_all(&self) -> VaultResult<Vec<Table>> {
        let data = read_guard(&self.data)?;

        let mut tables: Vec<_> = data.values().cloned().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    /// Check if a table exists
    pub fn exists(&self, id: TableId) -> VaultResult<bool> {
        let data = read_guard(&self.data)?;
        Ok(data.contains_key(&id))
    }

    /// Count tables
    pub fn count(&self) -> VaultResult<usize> {
        let data = read_guard(&self.data)?;
        Ok(data.len())
    }

    /// Insert a new table
    ///
    /// Fails if the name is already taken. The record is persisted before
    /// this returns; on a failed write nothing changes.
    pub fn insert(&self, table: Table) -> VaultResult<TableId> {
        let mut data = write_guard(&self.data)?;
        let mut by_name = write_guard(&self.by_name)?;

        if by_name.contains_key(&table.name) {
            return Err(VaultError::duplicate_table(&table.name));
        }
        if data.contains_key(&table.id) {
            return Err(VaultError::Storage(format!("Table id collision: {}", table.id)));
        }

        let id = table.id;
        by_name.insert(table.name.clone(), id);
        data.insert(id, table);

        if let Err(e) = self.persist(&data) {
            if let Some(table) = data.remove(&id) {
                by_name.remove(&table.name);
            }
            return Err(e);
        }

        Ok(id)
    }

    /// Replace an existing table record
    ///
    /// Fails if the id is unknown or the record's name belongs to another
    /// table.
    pub fn update(&self, table: Table) -> VaultResult<()> {
        let mut data = write_guard(&self.data)?;
        let mut by_name = write_guard(&self.by_name)?;

        let id = table.id;
        let old_name = match data.get(&id) {
            Some(existing) => existing.name.clone(),
            None => return Err(VaultError::table_not_found(id.to_string())),
        };

        let renamed = old_name != table.name;
        if renamed && by_name.contains_key(&table.name) {
            return Err(VaultError::duplicate_table(&table.name));
        }

        let new_name = table.name.clone();
        let previous = data.insert(id, table);
        if renamed {
            by_name.remove(&old_name);
            by_name.insert(new_name.clone(), id);
        }

        if let Err(e) = self.persist(&data) {
            if let Some(previous) = previous {
                data.insert(id, previous);
            }
            if renamed {
                by_name.remove(&new_name);
                by_name.insert(old_name, id);
            }
            return Err(e);
        }

        Ok(())
    }

    /// Remove a table, returning the removed record
    pub fn remove(&self, id: TableId) -> VaultResult<Table> {
        let mut data = write_guard(&self.data)?;
        let mut by_name = write_guard(&self.by_name)?;

        let table = data
            .remove(&id)
            .ok_or_else(|| VaultError::table_not_found(id.to_string()))?;
        by_name.remove(&table.name);

        if let Err(e) = self.persist(&data) {
            by_name.insert(table.name.clone(), id);
            data.insert(id, table);
            return Err(e);
        }

        Ok(table)
    }

    fn persist(&self, data: &HashMap<TableId, Table>) -> VaultResult<()> {
        let mut tables: Vec<&Table> = data.values().collect();
        tables.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));

        write_json_atomic(&self.path, &TableDataRef { tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TableRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tables.json");
        let repo = TableRepository::new(path);
        (temp_dir, repo)
    }

    fn table(name: &str) -> Table {
        Table::new(name, vec!["a".into()], vec![vec![Some("1".into())]])
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_and_get() {
        let (_temp_dir, repo) = create_test_repo();
        let id = repo.insert(table("orders")).unwrap();

        let by_id = repo.get(id).unwrap().unwrap();
        assert_eq!(by_id.name, "orders");

        let by_name = repo.get_by_name("orders").unwrap().unwrap();
        assert_eq!(by_name.id, id);

        // Exact match only
        assert!(repo.get_by_name("Orders").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (_temp_dir, repo) = create_test_repo();
        repo.insert(table("orders")).unwrap();

        let err = repo.insert(table("orders")).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let id = repo.insert(table("orders")).unwrap();

        let repo2 = TableRepository::new(temp_dir.path().join("tables.json"));
        repo2.load().unwrap();

        let loaded = repo2.get(id).unwrap().unwrap();
        assert_eq!(loaded.name, "orders");
        assert!(repo2.get_by_name("orders").unwrap().is_some());
    }

    #[test]
    fn test_update_renames_index() {
        let (_temp_dir, repo) = create_test_repo();
        let id = repo.insert(table("old")).unwrap();

        let mut record = repo.get(id).unwrap().unwrap();
        record.name = "new".into();
        repo.update(record).unwrap();

        assert!(repo.get_by_name("old").unwrap().is_none());
        assert_eq!(repo.get_by_name("new").unwrap().unwrap().id, id);
    }

    #[test]
    fn test_update_rejects_taken_name() {
        let (_temp_dir, repo) = create_test_repo();
        repo.insert(table("first")).unwrap();
        let id = repo.insert(table("second")).unwrap();

        let mut record = repo.get(id).unwrap().unwrap();
        record.name = "first".into();
        assert!(repo.update(record).unwrap_err().is_duplicate());
        assert_eq!(repo.get(id).unwrap().unwrap().name, "second");
    }

    #[test]
    fn test_update_unknown_id() {
        let (_temp_dir, repo) = create_test_repo();
        assert!(repo.update(table("ghost")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_remove() {
        let (_temp_dir, repo) = create_test_repo();
        let id = repo.insert(table("orders")).unwrap();

        let removed = repo.remove(id).unwrap();
        assert_eq!(removed.name, "orders");
        assert!(!repo.exists(id).unwrap());
        assert!(repo.get_by_name("orders").unwrap().is_none());

        // Second removal fails
        assert!(repo.remove(id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the collection file should be makes the rename fail
        let path = temp_dir.path().join("tables.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();
        let repo = TableRepository::new(path);

        let result = repo.insert(table("orders"));
        assert!(matches!(result, Err(VaultError::Storage(_))));
        assert_eq!(repo.count().unwrap(), 0);
        assert!(repo.get_by_name("orders").unwrap().is_none());
    }

    #[test]
    fn test_get_all_sorted_by_name() {
        let (_temp_dir, repo) = create_test_repo();
        repo.insert(table("zeta")).unwrap();
        repo.insert(table("alpha")).unwrap();

        let names: Vec<_> = repo.get_all().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
