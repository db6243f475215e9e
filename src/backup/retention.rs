//! Backup retention policy
//!
//! Keeps the newest N backups of a table and marks the rest for deletion.

use crate::config::settings::BackupRetention;
use crate::models::{Backup, BackupId};

/// Count-based retention for the backups of one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    keep: usize,
}

impl RetentionPolicy {
    /// Keep the `keep` most recent backups (at least one)
    pub fn new(keep: usize) -> Self {
        Self { keep: keep.max(1) }
    }

    /// Number of backups kept per table
    pub fn keep(&self) -> usize {
        self.keep
    }

    /// IDs of the backups that fall outside the policy
    ///
    /// Backups are ranked by timestamp, newest first; everything after the
    /// first `keep` is expired. Input order does not matter.
    pub fn expired(&self, backups: &[Backup]) -> Vec<BackupId> {
        let mut ranked: Vec<&Backup> = backups.iter().collect();
        ranked.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        ranked.into_iter().skip(self.keep).map(|b| b.id).collect()
    }
}

impl From<&BackupRetention> for RetentionPolicy {
    fn from(retention: &BackupRetention) -> Self {
        Self::new(retention.keep_per_table as usize)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from(&BackupRetention::default())
    }
}
