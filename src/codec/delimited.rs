//! Delimited text parsing and serialization
//!
//! Thin adapter over the `csv` crate. Records may have any number of fields;
//! no header interpretation happens here.

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::{VaultError, VaultResult};
use crate::models::Row;

/// Parse delimited text into rows of cells
///
/// Every field becomes `Some(..)`, including empty ones. Blank lines are
/// skipped.
pub fn parse(text: &str, delimiter: u8) -> VaultResult<Vec<Row>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|field| Some(field.to_string())).collect());
    }

    Ok(rows)
}

/// Serialize rows as comma-separated text
pub fn serialize(rows: &[Row]) -> VaultResult<String> {
    serialize_with(rows, b',')
}

/// Serialize rows with a custom delimiter
///
/// Null cells are written as empty fields.
pub fn serialize_with(rows: &[Row], delimiter: u8) -> VaultResult<String> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| VaultError::Csv(format!("Failed to flush CSV output: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| VaultError::Csv(format!("CSV output is not UTF-8: {}", e)))
}

/// Parse a user-facing delimiter name into its byte
pub fn parse_delimiter(value: &str) -> VaultResult<u8> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" => Ok(b','),
        "semicolon" => Ok(b';'),
        "pipe" => Ok(b'|'),
        single if single.len() == 1 && single.is_ascii() => Ok(single.as_bytes()[0]),
        other => Err(VaultError::Validation(format!(
            "Invalid delimiter '{}' (expected a single ASCII character or 'tab')",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Row {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_parse_basic() {
        let rows = parse("id,amt\n1,10\n2,20\n", b',').unwrap();
        assert_eq!(
            rows,
            vec![cells(&["id", "amt"]), cells(&["1", "10"]), cells(&["2", "20"])]
        );
    }

    #[test]
    fn test_parse_ragged_and_quoted() {
        let rows = parse("a;b;c\n1\n\"x;y\";2;3;4\n", b';').unwrap();
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1], cells(&["1"]));
        assert_eq!(rows[2], cells(&["x;y", "2", "3", "4"]));
    }

    #[test]
    fn test_parse_keeps_empty_fields() {
        let rows = parse("a,,c\n", b',').unwrap();
        assert_eq!(rows, vec![cells(&["a", "", "c"])]);
    }

    #[test]
    fn test_serialize_nulls_and_quotes() {
        let rows = vec![
            cells(&["id", "note"]),
            vec![Some("1".into()), None],
            cells(&["2", "has,comma"]),
        ];
        let text = serialize(&rows).unwrap();
        assert_eq!(text, "id,note\n1,\n2,\"has,comma\"\n");
    }

    #[test]
    fn test_text_round_trip_ragged() {
        let rows = vec![cells(&["a", "b"]), cells(&["1"]), cells(&["2", "3", "4"])];
        let text = serialize_with(&rows, b'\t').unwrap();
        assert_eq!(parse(&text, b'\t').unwrap(), rows);
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("pipe").unwrap(), b'|');
        assert!(parse_delimiter("::").unwrap_err().is_validation());
        assert!(parse_delimiter("").unwrap_err().is_validation());
    }
}
