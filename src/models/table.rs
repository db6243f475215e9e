//! Table model
//!
//! A named tabular dataset: ordered column labels plus ordered rows of
//! nullable string cells. Row length is not enforced against the column
//! count; ragged rows are stored as given.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TableId;

/// A single cell; `None` is a null cell
pub type Cell = Option<String>;

/// One row of cells
pub type Row = Vec<Cell>;

/// A stored table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Unique identifier
    pub id: TableId,

    /// Table name, unique across live tables
    pub name: String,

    /// Header labels
    #[serde(default)]
    pub columns: Vec<String>,

    /// Row data
    #[serde(default)]
    pub rows: Vec<Row>,

    /// Denormalized row count
    pub row_count: usize,

    /// When the table was created
    pub created_at: DateTime<Utc>,

    /// When the table was last modified
    pub last_modified: DateTime<Utc>,
}

impl Table {
    /// Create a new table with a fresh ID
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        let now = Utc::now();
        Self {
            id: TableId::new(),
            name: name.into(),
            row_count: rows.len(),
            columns,
            rows,
            created_at: now,
            last_modified: now,
        }
    }

    /// Number of header columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Replace row data and keep `row_count` in step
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.row_count = rows.len();
        self.rows = rows;
    }

    /// Mark the table as modified now
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }

    /// The header as a row of cells
    pub fn header_row(&self) -> Row {
        self.columns.iter().cloned().map(Some).collect()
    }

    /// Serialized size of the row data in bytes
    pub fn data_size_bytes(&self) -> usize {
        serde_json::to_vec(&self.rows).map(|v| v.len()).unwrap_or(0)
    }

    /// Validate the table
    pub fn validate(&self) -> Result<(), TableValidationError> {
        if self.name.trim().is_empty() {
            return Err(TableValidationError::EmptyName);
        }

        if self.row_count != self.rows.len() {
            return Err(TableValidationError::RowCountMismatch {
                recorded: self.row_count,
                actual: self.rows.len(),
            });
        }

        Ok(())
    }
}

/// Summary statistics for a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStats {
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub size_bytes: usize,
    pub size_formatted: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// A window of rows out of a table
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    /// Header labels of the table
    pub columns: Vec<String>,
    /// Rows in this page
    pub rows: Vec<Row>,
    /// Zero-based page index
    pub page: usize,
    /// Total number of pages (at least 1)
    pub total_pages: usize,
    /// Total rows in the table
    pub total_rows: usize,
    /// Index of the first row in this page
    pub start: usize,
    /// One past the index of the last row in this page
    pub end: usize,
}

impl TablePage {
    /// Whether a previous page exists
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Whether a next page exists
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// Validation errors for tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableValidationError {
    EmptyName,
    RowCountMismatch { recorded: usize, actual: usize },
}

impl std::fmt::Display for TableValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Table name cannot be empty"),
            Self::RowCountMismatch { recorded, actual } => write!(
                f,
                "Row count {} does not match {} stored rows",
                recorded, actual
            ),
        }
    }
}

impl std::error::Error for TableValidationError {}

/// Format a byte count the way the table overview shows it
pub fn format_bytes(bytes: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Row {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_new_table() {
        let table = Table::new(
            "orders",
            vec!["id".into(), "amt".into()],
            vec![cells(&["1", "10"]), cells(&["2", "20"])],
        );

        assert_eq!(table.name, "orders");
        assert_eq!(table.row_count, 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.created_at, table.last_modified);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_set_rows_updates_count() {
        let mut table = Table::new("t", vec![], vec![]);
        table.set_rows(vec![cells(&["a"]), cells(&["b"]), cells(&["c"])]);
        assert_eq!(table.row_count, 3);
    }

    #[test]
    fn test_validation() {
        let table = Table::new("  ", vec![], vec![]);
        assert_eq!(table.validate(), Err(TableValidationError::EmptyName));

        let mut table = Table::new("t", vec![], vec![cells(&["a"])]);
        table.row_count = 5;
        assert!(matches!(
            table.validate(),
            Err(TableValidationError::RowCountMismatch { recorded: 5, actual: 1 })
        ));
    }

    #[test]
    fn test_data_size_counts_nulls() {
        let table = Table::new("t", vec!["a".into()], vec![vec![None, Some("x".into())]]);
        // [[null,"x"]]
        assert_eq!(table.data_size_bytes(), 12);
    }

    #[test]
    fn test_header_row() {
        let table = Table::new("t", vec!["a".into(), "b".into()], vec![]);
        assert_eq!(table.header_row(), cells(&["a", "b"]));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(500), "500 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn test_serde_round_trip_ragged() {
        let table = Table::new(
            "ragged",
            vec!["a".into(), "b".into()],
            vec![cells(&["1"]), vec![Some("2".into()), None, Some("extra".into())]],
        );

        let json = serde_json::to_string(&table).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(table, back);
    }
}
