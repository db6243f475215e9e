//! Storage layer for tablevault
//!
//! Provides JSON file storage with atomic writes, per-table mutation locks,
//! and automatic directory creation.

pub mod backups;
pub mod file_io;
pub mod locks;
pub mod tables;

pub use backups::BackupRepository;
pub use file_io::{read_json, write_bytes_atomic, write_json_atomic};
pub use locks::TableLocks;
pub use tables::TableRepository;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::backup::ScheduleRegistry;
use crate::config::paths::VaultPaths;
use crate::config::settings::{BackupRetention, Settings};
use crate::error::VaultError;

/// Main storage handle that provides access to both collections
///
/// Opened once at startup and shared by reference (or `Arc`) with every
/// service and the auto-backup scheduler.
pub struct Storage {
    paths: VaultPaths,
    settings: Settings,
    pub tables: TableRepository,
    pub backups: BackupRepository,
    pub locks: TableLocks,
    pub schedules: ScheduleRegistry,
}

impl Storage {
    /// Open the store: create directories and load both collections
    pub fn open(paths: VaultPaths, settings: Settings) -> Result<Self, VaultError> {
        paths.ensure_directories()?;

        let storage = Self {
            tables: TableRepository::new(paths.tables_file()),
            backups: BackupRepository::new(paths.backups_file()),
            locks: TableLocks::new(),
            schedules: ScheduleRegistry::new(),
            paths,
            settings,
        };

        storage.tables.load()?;
        storage.backups.load()?;

        tracing::debug!(
            data_dir = %storage.paths.data_dir().display(),
            tables = storage.tables.count()?,
            backups = storage.backups.count()?,
            "Storage opened"
        );

        Ok(storage)
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    /// Get the settings the store was opened with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the backup retention policy
    pub fn retention(&self) -> &BackupRetention {
        &self.settings.backup_retention
    }

    /// Cancel every auto-backup schedule
    ///
    /// Returns the number of schedules that were stopped.
    pub fn shutdown(&self) -> usize {
        let cancelled = self.schedules.cancel_all();
        if cancelled > 0 {
            tracing::info!(cancelled, "Stopped auto-backup schedules");
        }
        cancelled
    }
}

pub(crate) fn read_guard<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, VaultError> {
    lock.read()
        .map_err(|e| VaultError::Storage(format!("Failed to acquire read lock: {}", e)))
}

pub(crate) fn write_guard<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, VaultError> {
    lock.write()
        .map_err(|e| VaultError::Storage(format!("Failed to acquire write lock: {}", e)))
}
