//! Auto-backup scheduling
//!
//! Each scheduled table gets one tokio task that runs an auto-backup cycle
//! immediately and then once per interval. Tasks are tracked in a
//! `ScheduleRegistry` so they can be cancelled when the table is deleted or
//! the store shuts down.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::{VaultError, VaultResult};
use crate::models::TableId;
use crate::services::BackupService;
use crate::storage::Storage;

/// Running auto-backup tasks, at most one per table
#[derive(Default)]
pub struct ScheduleRegistry {
    tasks: Mutex<HashMap<TableId, JoinHandle<()>>>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a task for `table_id`, aborting any task it replaces
    ///
    /// Returns true if an earlier schedule was replaced.
    pub fn register(&self, table_id: TableId, handle: JoinHandle<()>) -> bool {
        match self.tasks().insert(table_id, handle) {
            Some(previous) => {
                previous.abort();
                true
            }
            None => false,
        }
    }

    /// Stop the schedule of one table
    pub fn cancel(&self, table_id: TableId) -> bool {
        match self.tasks().remove(&table_id) {
            Some(handle) => {
                handle.abort();
                tracing::debug!(table_id = %table_id, "Auto-backup schedule cancelled");
                true
            }
            None => false,
        }
    }

    /// Stop every schedule
    pub fn cancel_all(&self) -> usize {
        let mut tasks = self.tasks();
        let count = tasks.len();
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
        count
    }

    /// Whether a live schedule exists for `table_id`
    pub fn is_scheduled(&self, table_id: TableId) -> bool {
        self.tasks()
            .get(&table_id)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// IDs of tables with a live schedule
    pub fn active(&self) -> Vec<TableId> {
        self.tasks()
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(id, _)| *id)
            .collect()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<TableId, JoinHandle<()>>> {
        // Handles stay valid even if a holder panicked
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ScheduleRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Longest accepted auto-backup interval, one hundred years
pub const MAX_INTERVAL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Convert a settings interval in hours to a duration
pub fn interval_hours(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(3600))
}

/// Start the auto-backup cycle for a table
///
/// Runs one cycle right away, then one per `interval` until cancelled.
/// Scheduling an already scheduled table replaces its schedule. A failed
/// cycle is logged and the schedule keeps running. Cycles run on the
/// blocking pool so a cycle waiting on a table lock never stalls the
/// runtime.
pub async fn schedule_auto_backup(
    storage: Arc<Storage>,
    table_id: TableId,
    interval: Duration,
) -> VaultResult<()> {
    if interval.is_zero() {
        return Err(VaultError::Validation(
            "Auto-backup interval must be greater than zero".into(),
        ));
    }

    if interval > MAX_INTERVAL {
        return Err(VaultError::Validation(format!(
            "Auto-backup interval of {} hour(s) is too long",
            interval.as_secs() / 3600
        )));
    }

    let first_tick = Instant::now().checked_add(interval).ok_or_else(|| {
        VaultError::Validation("Auto-backup interval is out of range".into())
    })?;

    if !storage.tables.exists(table_id)? {
        return Err(VaultError::table_not_found(table_id.to_string()));
    }

    run_cycle(Arc::clone(&storage), table_id).await;

    let task_storage = Arc::clone(&storage);
    let handle = tokio::spawn(async move {
        let mut ticker = time::interval_at(first_tick, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_cycle(Arc::clone(&task_storage), table_id).await;
        }
    });

    let replaced = storage.schedules.register(table_id, handle);

    // The table may have been deleted while the first cycle ran
    if !storage.tables.exists(table_id)? {
        storage.schedules.cancel(table_id);
        return Err(VaultError::table_not_found(table_id.to_string()));
    }

    tracing::info!(
        table_id = %table_id,
        interval_secs = interval.as_secs(),
        replaced,
        "Auto-backup scheduled"
    );

    Ok(())
}

async fn run_cycle(storage: Arc<Storage>, table_id: TableId) {
    let cycle =
        task::spawn_blocking(move || BackupService::new(&storage).auto_backup(table_id)).await;

    match cycle {
        Ok(Ok(outcome)) => tracing::info!(
            table_id = %table_id,
            backup_id = %outcome.backup_id,
            pruned = outcome.pruned,
            "Auto-backup completed"
        ),
        Ok(Err(e)) => tracing::error!(table_id = %table_id, error = %e, "Auto-backup failed"),
        Err(e) => tracing::error!(table_id = %table_id, error = %e, "Auto-backup task panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::VaultPaths;
    use crate::config::settings::Settings;
    use crate::models::Table;
    use crate::services::TableService;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn create_test_storage() -> (TempDir, Arc<Storage>) {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths, Settings::default()).unwrap();
        (temp_dir, Arc::new(storage))
    }

    fn create_orders(storage: &Storage) -> TableId {
        TableService::new(storage)
            .create(
                "orders",
                vec!["id".into(), "amt".into()],
                vec![vec![Some("1".into()), Some("10".into())]],
            )
            .unwrap()
    }

    fn backup_count(storage: &Storage, table_id: TableId) -> usize {
        storage.backups.get_by_table_id(table_id).unwrap().len()
    }

    #[test]
    fn test_interval_hours() {
        assert_eq!(interval_hours(24), Duration::from_secs(86_400));
        assert_eq!(interval_hours(0), Duration::ZERO);
        assert!(interval_hours(u64::MAX) > MAX_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_interval() {
        let (_temp_dir, storage) = create_test_storage();
        let id = create_orders(&storage);

        schedule_auto_backup(Arc::clone(&storage), id, HOUR)
            .await
            .unwrap();
        assert_eq!(backup_count(&storage, id), 1);
        assert!(storage.schedules.is_scheduled(id));

        time::sleep(HOUR * 2 + Duration::from_secs(1)).await;
        assert_eq!(backup_count(&storage, id), 3);

        let backups = storage.backups.get_by_table_id(id).unwrap();
        assert!(backups.iter().all(|b| b.description == "Auto-backup"));

        storage.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_retention_caps_scheduled_backups() {
        let (_temp_dir, storage) = create_test_storage();
        let id = create_orders(&storage);

        schedule_auto_backup(Arc::clone(&storage), id, HOUR)
            .await
            .unwrap();
        time::sleep(HOUR * 12 + Duration::from_secs(1)).await;

        assert_eq!(backup_count(&storage, id), 7);
        storage.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let id = create_orders(&storage);

        let err = schedule_auto_backup(Arc::clone(&storage), id, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(backup_count(&storage, id), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_interval_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let id = create_orders(&storage);

        let err = schedule_auto_backup(Arc::clone(&storage), id, interval_hours(u64::MAX))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(backup_count(&storage, id), 0);
        assert!(storage.schedules.active().is_empty());

        let err = schedule_auto_backup(Arc::clone(&storage), id, MAX_INTERVAL + HOUR)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_locked_table_does_not_stall_runtime() {
        let (_temp_dir, storage) = create_test_storage();
        let id = create_orders(&storage);

        let released = Arc::new(AtomicBool::new(false));
        let (locked_tx, locked_rx) = mpsc::channel();
        let holder = {
            let storage = Arc::clone(&storage);
            let released = Arc::clone(&released);
            std::thread::spawn(move || {
                storage.locks.run_exclusive(id, || {
                    locked_tx.send(()).unwrap();
                    std::thread::sleep(Duration::from_millis(300));
                    released.store(true, Ordering::SeqCst);
                    Ok(())
                })
            })
        };
        locked_rx.recv().unwrap();

        let schedule = tokio::spawn(schedule_auto_backup(Arc::clone(&storage), id, HOUR));

        // The single runtime thread keeps serving timers while the cycle waits
        time::sleep(Duration::from_millis(50)).await;
        assert!(!released.load(Ordering::SeqCst));

        schedule.await.unwrap().unwrap();
        holder.join().unwrap().unwrap();
        assert_eq!(backup_count(&storage, id), 1);

        storage.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_table_rejected() {
        let (_temp_dir, storage) = create_test_storage();

        let err = schedule_auto_backup(Arc::clone(&storage), TableId::new(), HOUR)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(storage.schedules.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_cancels_schedule() {
        let (_temp_dir, storage) = create_test_storage();
        let id = create_orders(&storage);

        schedule_auto_backup(Arc::clone(&storage), id, HOUR)
            .await
            .unwrap();
        TableService::new(&storage).delete(id).unwrap();

        assert!(!storage.schedules.is_scheduled(id));
        assert!(storage.schedules.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_keeps_schedule_alive() {
        let (_temp_dir, storage) = create_test_storage();
        let id = create_orders(&storage);

        schedule_auto_backup(Arc::clone(&storage), id, HOUR)
            .await
            .unwrap();

        // Remove the table behind the service's back so the next cycle fails
        let removed = storage.tables.remove(id).unwrap();
        time::sleep(HOUR + Duration::from_secs(1)).await;
        assert!(storage.schedules.is_scheduled(id));
        assert_eq!(backup_count(&storage, id), 1);

        // Once the table is back the schedule picks it up again
        let mut restored = Table::new(removed.name, removed.columns, removed.rows);
        restored.id = id;
        storage.tables.insert(restored).unwrap();
        time::sleep(HOUR).await;
        assert_eq!(backup_count(&storage, id), 2);

        storage.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_previous() {
        let (_temp_dir, storage) = create_test_storage();
        let id = create_orders(&storage);

        schedule_auto_backup(Arc::clone(&storage), id, HOUR)
            .await
            .unwrap();
        schedule_auto_backup(Arc::clone(&storage), id, HOUR * 4)
            .await
            .unwrap();
        assert_eq!(storage.schedules.active(), vec![id]);
        assert_eq!(backup_count(&storage, id), 2);

        // Only the four-hour schedule is left running
        time::sleep(HOUR * 3 + Duration::from_secs(1)).await;
        assert_eq!(backup_count(&storage, id), 2);

        assert_eq!(storage.shutdown(), 1);
        assert!(!storage.schedules.is_scheduled(id));
    }
}
