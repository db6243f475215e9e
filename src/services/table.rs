//! Table service
//!
//! Provides business logic for tables: creation, lookup, row-level
//! mutation, CSV import/export and statistics. Every mutation runs under
//! the table's lock so concurrent writers never lose an update.

use crate::error::{VaultError, VaultResult};
use crate::models::{format_bytes, Row, Table, TableId, TablePage, TableStats};
use crate::storage::Storage;

/// Fields to overwrite on an existing table
#[derive(Debug, Clone, Default)]
pub(crate) struct TablePatch {
    pub name: Option<String>,
    pub columns: Option<Vec<String>>,
    pub rows: Option<Vec<Row>>,
}

/// Service for table management
pub struct TableService<'a> {
    storage: &'a Storage,
}

impl<'a> TableService<'a> {
    /// Create a new table service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new table
    pub fn create(&self, name: &str, columns: Vec<String>, rows: Vec<Row>) -> VaultResult<TableId> {
        if self.storage.tables.get_by_name(name)?.is_some() {
            return Err(VaultError::duplicate_table(name));
        }

        let table = Table::new(name, columns, rows);
        table
            .validate()
            .map_err(|e| VaultError::Validation(e.to_string()))?;

        let row_count = table.row_count;
        let id = self.storage.tables.insert(table)?;

        tracing::info!(table = %name, id = %id, rows = row_count, "Created table");
        Ok(id)
    }

    /// List all tables, sorted by name
    pub fn list(&self) -> VaultResult<Vec<Table>> {
        self.storage.tables.get_all()
    }

    /// Get a table by its exact name
    pub fn get_by_name(&self, name: &str) -> VaultResult<Option<Table>> {
        self.storage.tables.get_by_name(name)
    }

    /// Get a table by ID
    pub fn get_by_id(&self, id: TableId) -> VaultResult<Option<Table>> {
        self.storage.tables.get(id)
    }

    /// Find a table by name or ID
    ///
    /// Names win over IDs. IDs may be given in full or in short form.
    pub fn find(&self, identifier: &str) -> VaultResult<Option<Table>> {
        if let Some(table) = self.storage.tables.get_by_name(identifier)? {
            return Ok(Some(table));
        }

        if let Ok(id) = identifier.parse::<TableId>() {
            return self.storage.tables.get(id);
        }

        let mut matches = self
            .storage
            .tables
            .get_all()?
            .into_iter()
            .filter(|t| t.id.matches(identifier));

        // Ambiguous short ids resolve to nothing
        match (matches.next(), matches.next()) {
            (Some(table), None) => Ok(Some(table)),
            _ => Ok(None),
        }
    }

    /// Tables whose name contains `term`, ignoring case
    pub fn search(&self, term: &str) -> VaultResult<Vec<Table>> {
        let term = term.to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|t| t.name.to_lowercase().contains(&term))
            .collect())
    }

    /// Merge a patch into a table under its lock
    pub(crate) fn update(&self, id: TableId, patch: TablePatch) -> VaultResult<TableId> {
        self.storage
            .locks
            .run_exclusive(id, || self.apply(id, patch))
    }

    /// Delete a table
    ///
    /// Backups of the table are kept. Its auto-backup schedule is stopped.
    pub fn delete(&self, id: TableId) -> VaultResult<Table> {
        let removed = self
            .storage
            .locks
            .run_exclusive(id, || self.storage.tables.remove(id))?;

        self.storage.schedules.cancel(id);
        self.storage.locks.forget(id)?;

        tracing::info!(table = %removed.name, id = %id, "Deleted table");
        Ok(removed)
    }

    /// Append rows to the end of a table
    pub fn append_rows(&self, id: TableId, new_rows: Vec<Row>) -> VaultResult<TableId> {
        let added = new_rows.len();
        self.storage.locks.run_exclusive(id, || {
            let mut rows = self.require(id)?.rows;
            rows.extend(new_rows);
            self.apply(
                id,
                TablePatch {
                    rows: Some(rows),
                    ..Default::default()
                },
            )
        })?;

        tracing::debug!(id = %id, added, "Appended rows");
        Ok(id)
    }

    /// Replace the row at `index`
    pub fn set_row(&self, id: TableId, index: usize, row: Row) -> VaultResult<TableId> {
        self.storage.locks.run_exclusive(id, || {
            let mut rows = self.require(id)?.rows;
            let len = rows.len();
            let slot = rows
                .get_mut(index)
                .ok_or(VaultError::IndexOutOfRange { index, len })?;
            *slot = row;

            self.apply(
                id,
                TablePatch {
                    rows: Some(rows),
                    ..Default::default()
                },
            )
        })?;

        tracing::debug!(id = %id, index, "Updated row");
        Ok(id)
    }

    /// Remove the row at `index`; later rows shift down
    pub fn delete_row(&self, id: TableId, index: usize) -> VaultResult<Row> {
        let removed = self.storage.locks.run_exclusive(id, || {
            let mut rows = self.require(id)?.rows;
            if index >= rows.len() {
                return Err(VaultError::IndexOutOfRange {
                    index,
                    len: rows.len(),
                });
            }
            let removed = rows.remove(index);

            self.apply(
                id,
                TablePatch {
                    rows: Some(rows),
                    ..Default::default()
                },
            )?;
            Ok(removed)
        })?;

        tracing::debug!(id = %id, index, "Deleted row");
        Ok(removed)
    }

    /// Rename a table
    pub fn rename(&self, id: TableId, new_name: &str) -> VaultResult<TableId> {
        let old_name = self.storage.locks.run_exclusive(id, || {
            let old_name = self.require(id)?.name;
            self.apply(
                id,
                TablePatch {
                    name: Some(new_name.to_string()),
                    ..Default::default()
                },
            )?;
            Ok(old_name)
        })?;

        tracing::info!(id = %id, from = %old_name, to = %new_name, "Renamed table");
        Ok(id)
    }

    /// Overwrite the columns and rows of a table
    pub fn replace_contents(
        &self,
        id: TableId,
        columns: Vec<String>,
        rows: Vec<Row>,
    ) -> VaultResult<TableId> {
        self.update(
            id,
            TablePatch {
                columns: Some(columns),
                rows: Some(rows),
                ..Default::default()
            },
        )
    }

    /// Import parsed CSV rows
    ///
    /// The first row is the header. With `append` and an existing table of
    /// that name, rows are added and the existing columns kept. Otherwise a
    /// new table is created.
    pub fn import_csv(
        &self,
        name: &str,
        header_plus_rows: Vec<Row>,
        append: bool,
    ) -> VaultResult<TableId> {
        let mut rows = header_plus_rows.into_iter();
        let header = rows
            .next()
            .ok_or_else(|| VaultError::EmptyInput("CSV input has no rows".into()))?;
        let rows: Vec<Row> = rows.collect();

        if append {
            if let Some(existing) = self.storage.tables.get_by_name(name)? {
                let imported = rows.len();
                let id = self.append_rows(existing.id, rows)?;
                tracing::info!(table = %name, rows = imported, "Appended CSV import");
                return Ok(id);
            }
        }

        let columns = header.into_iter().map(Option::unwrap_or_default).collect();
        self.create(name, columns, rows)
    }

    /// Export a table as rows: the header first, then the data
    pub fn export_csv(&self, id: TableId) -> VaultResult<Vec<Row>> {
        let table = self.require(id)?;

        let mut rows = Vec::with_capacity(table.rows.len() + 1);
        rows.push(table.header_row());
        rows.extend(table.rows);
        Ok(rows)
    }

    /// Summary statistics for a table
    pub fn stats(&self, id: TableId) -> VaultResult<TableStats> {
        let table = self.require(id)?;
        let size_bytes = table.data_size_bytes();

        Ok(TableStats {
            row_count: table.row_count,
            column_count: table.column_count(),
            size_bytes,
            size_formatted: format_bytes(size_bytes),
            created_at: table.created_at,
            last_modified: table.last_modified,
            name: table.name,
        })
    }

    /// A zero-based page of rows
    pub fn page(&self, id: TableId, page: usize, per_page: usize) -> VaultResult<TablePage> {
        if per_page == 0 {
            return Err(VaultError::Validation(
                "Rows per page must be greater than zero".into(),
            ));
        }

        let table = self.require(id)?;
        let total_rows = table.rows.len();
        let total_pages = total_rows.div_ceil(per_page).max(1);

        if page >= total_pages {
            return Err(VaultError::Validation(format!(
                "Page {} does not exist (table has {} pages)",
                page + 1,
                total_pages
            )));
        }

        let start = page * per_page;
        let end = (start + per_page).min(total_rows);
        let rows = table.rows[start..end].to_vec();

        Ok(TablePage {
            columns: table.columns,
            rows,
            page,
            total_pages,
            total_rows,
            start,
            end,
        })
    }

    fn require(&self, id: TableId) -> VaultResult<Table> {
        self.storage
            .tables
            .get(id)?
            .ok_or_else(|| VaultError::table_not_found(id.to_string()))
    }

    // Caller must hold the table's lock
    fn apply(&self, id: TableId, patch: TablePatch) -> VaultResult<TableId> {
        let mut table = self.require(id)?;

        if let Some(name) = patch.name {
            table.name = name;
        }
        if let Some(columns) = patch.columns {
            table.columns = columns;
        }
        if let Some(rows) = patch.rows {
            table.set_rows(rows);
        }
        table.touch();

        table
            .validate()
            .map_err(|e| VaultError::Validation(e.to_string()))?;

        self.storage.tables.update(table)?;
        Ok(id)
    }
}
