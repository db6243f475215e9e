//! Backup system for tablevault
//!
//! Provides per-table snapshots with count-based retention, portable
//! snapshot files and scheduled auto-backups.
//!
//! # Architecture
//!
//! - `RetentionPolicy`: decides which backups of a table fall out of retention
//! - `SnapshotFile`: the JSON document a backup is exported to and imported from
//! - `ScheduleRegistry` and `schedule_auto_backup`: periodic auto-backup tasks
//!
//! Creating, listing and restoring backups goes through
//! `services::BackupService`.
//!
//! # Retention Policy
//!
//! By default the 7 most recent backups of each table are kept. Pruning
//! runs after every auto-backup and on demand.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tablevault::backup::{interval_hours, schedule_auto_backup};
//!
//! let storage = Arc::new(Storage::open(paths, settings)?);
//! schedule_auto_backup(Arc::clone(&storage), table_id, interval_hours(24)).await?;
//!
//! // On exit
//! storage.shutdown();
//! ```

mod retention;
mod scheduler;
mod snapshot;

pub use retention::RetentionPolicy;
pub use scheduler::{interval_hours, schedule_auto_backup, ScheduleRegistry, MAX_INTERVAL};
pub use snapshot::{snapshot_file_name, SnapshotFile};
