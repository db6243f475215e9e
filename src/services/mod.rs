//! Service layer for tablevault
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, per-table locking and cross-collection operations
//! such as backup and restore.

pub mod backup;
pub mod table;

pub use backup::{AutoBackupOutcome, BackupService, AUTO_BACKUP_DESCRIPTION};
pub use table::TableService;
