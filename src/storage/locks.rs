//! Per-table mutation locks
//!
//! Every read-modify-write on a table runs while holding that table's lock,
//! so concurrent mutations of the same table are applied one after another.
//! Mutations of different tables do not contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{VaultError, VaultResult};
use crate::models::TableId;

/// Registry of per-table mutexes
#[derive(Default)]
pub struct TableLocks {
    locks: Mutex<HashMap<TableId, Arc<Mutex<()>>>>,
}

impl TableLocks {
    /// Create an empty lock registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `id`
    ///
    /// Must not be nested for the same id.
    pub fn run_exclusive<T, F>(&self, id: TableId, f: F) -> VaultResult<T>
    where
        F: FnOnce() -> VaultResult<T>,
    {
        let lock = self.entry(id)?;
        // The mutex guards no data, so a poisoned lock is still usable
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }

    /// Drop the lock entry of a deleted table
    pub fn forget(&self, id: TableId) -> VaultResult<()> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire lock registry: {}", e)))?;
        locks.remove(&id);
        Ok(())
    }

    /// Number of tables with a lock entry
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    fn entry(&self, id: TableId) -> VaultResult<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire lock registry: {}", e)))?;
        Ok(Arc::clone(locks.entry(id).or_default()))
    }
}
