//! CSV codec adapter
//!
//! Converts between raw file contents and the row model the store works
//! with:
//! - `encoding`: bytes to text
//! - `delimited`: text to rows and back
//! - header-row selection and export file naming

pub mod delimited;
pub mod encoding;

pub use delimited::{parse, parse_delimiter, serialize, serialize_with};
pub use encoding::TextEncoding;

use chrono::NaiveDate;

use crate::error::{VaultError, VaultResult};
use crate::models::Row;

/// Drop any preamble lines above the header row
///
/// `header_row` is zero-based. The returned rows start with the header.
pub fn split_header(mut rows: Vec<Row>, header_row: usize) -> VaultResult<Vec<Row>> {
    if header_row >= rows.len() {
        return Err(VaultError::EmptyInput(format!(
            "Header row {} is past the end of the input ({} rows)",
            header_row + 1,
            rows.len()
        )));
    }

    rows.drain(..header_row);
    Ok(rows)
}

/// Decode, parse and header-align one input file
pub fn read_rows(
    bytes: &[u8],
    encoding: TextEncoding,
    delimiter: u8,
    header_row: usize,
) -> VaultResult<Vec<Row>> {
    let text = encoding.decode(bytes);
    let rows = parse(&text, delimiter)?;
    split_header(rows, header_row)
}

/// File name for a CSV export: `<tableName>_<YYYY-MM-DD>.csv`
pub fn csv_file_name(table_name: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", file_safe(table_name), date.format("%Y-%m-%d"))
}

/// Replace characters that cannot appear in a file name component
pub fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_header_drops_preamble() {
        let rows = parse("Report 2024\n\nid,name\n1,a\n", b',').unwrap();
        // The blank line is skipped by the parser, so the header is index 1
        let rows = split_header(rows, 1).unwrap();
        assert_eq!(rows[0], vec![Some("id".into()), Some("name".into())]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_split_header_out_of_range() {
        let err = split_header(vec![], 0).unwrap_err();
        assert!(matches!(err, VaultError::EmptyInput(_)));
    }

    #[test]
    fn test_read_rows_latin1_semicolon() {
        let rows = read_rows(b"Name;Stadt\nM\xFCller;K\xF6ln\n", TextEncoding::Latin1, b';', 0)
            .unwrap();
        assert_eq!(rows[1], vec![Some("Müller".into()), Some("Köln".into())]);
    }

    #[test]
    fn test_csv_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(csv_file_name("orders", date), "orders_2024-03-09.csv");
        assert_eq!(csv_file_name("q1/q2", date), "q1_q2_2024-03-09.csv");
    }
}
