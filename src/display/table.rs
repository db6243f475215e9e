//! Table display formatting
//!
//! Formats tables for terminal output in list, page and stats views.

use crate::models::{format_bytes, Cell, Table, TablePage, TableStats};

const MAX_CELL_WIDTH: usize = 32;
const NULL_MARKER: &str = "NULL";

/// Format a list of tables as an overview
pub fn format_table_list(tables: &[Table]) -> String {
    if tables.is_empty() {
        return "No tables found.".to_string();
    }

    // Calculate column widths
    let name_width = tables
        .iter()
        .map(|t| t.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    // Build header
    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<name_width$}  {:>8}  {:>7}  {:>12}  {}\n",
        "ID",
        "Name",
        "Rows",
        "Columns",
        "Size",
        "Modified",
        name_width = name_width,
    ));

    // Separator line
    output.push_str(&format!(
        "{:-<12}  {:-<name_width$}  {:->8}  {:->7}  {:->12}  {:-<16}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for table in tables {
        output.push_str(&format!(
            "{:<12}  {:<name_width$}  {:>8}  {:>7}  {:>12}  {}\n",
            table.id.to_string(),
            table.name,
            table.row_count,
            table.column_count(),
            format_bytes(table.data_size_bytes()),
            table.last_modified.format("%Y-%m-%d %H:%M"),
            name_width = name_width,
        ));
    }

    output
}

/// Format one page of a table's rows as a grid
pub fn format_table_page(name: &str, page: &TablePage) -> String {
    let mut output = String::new();
    output.push_str(&format!("Table: {}\n\n", name));

    // Widest row decides how many grid columns are shown
    let width = page
        .rows
        .iter()
        .map(|r| r.len())
        .max()
        .unwrap_or(0)
        .max(page.columns.len());

    if width == 0 {
        output.push_str("(empty table)\n");
        return output;
    }

    let header: Vec<String> = (0..width)
        .map(|i| page.columns.get(i).cloned().unwrap_or_default())
        .collect();
    let body: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|row| (0..width).map(|i| render_cell(row.get(i))).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| clip(h).chars().count()).collect();
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let index_width = page.end.to_string().len().max(1);

    let header_cells: Vec<String> = header
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<w$}", clip(h), w = *w))
        .collect();
    output.push_str(&format!(
        "{:>index_width$}  {}\n",
        "#",
        header_cells.join("  ").trim_end(),
        index_width = index_width,
    ));

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(1))).collect();
    output.push_str(&format!(
        "{:->index_width$}  {}\n",
        "",
        separator.join("  "),
        index_width = index_width,
    ));

    for (offset, row) in body.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect();
        output.push_str(&format!(
            "{:>index_width$}  {}\n",
            page.start + offset,
            cells.join("  ").trim_end(),
            index_width = index_width,
        ));
    }

    output.push('\n');
    if page.total_rows == 0 {
        output.push_str("No rows.\n");
    } else {
        output.push_str(&format!(
            "Showing rows {}-{} of {} (page {} of {})\n",
            page.start + 1,
            page.end,
            page.total_rows,
            page.page + 1,
            page.total_pages,
        ));
    }

    output
}

/// Format a table's summary statistics
pub fn format_table_stats(stats: &TableStats) -> String {
    let mut output = String::new();

    output.push_str(&format!("Table: {}\n", stats.name));
    output.push_str(&format!("  Rows:      {}\n", stats.row_count));
    output.push_str(&format!("  Columns:   {}\n", stats.column_count));
    output.push_str(&format!("  Data Size: {}\n", stats.size_formatted));
    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        stats.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!(
        "  Modified: {}\n",
        stats.last_modified.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}

fn render_cell(cell: Option<&Cell>) -> String {
    match cell {
        Some(Some(value)) => clip(value),
        Some(None) => NULL_MARKER.to_string(),
        None => String::new(),
    }
}

fn clip(value: &str) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= MAX_CELL_WIDTH {
        return flat;
    }
    let mut clipped: String = flat.chars().take(MAX_CELL_WIDTH - 3).collect();
    clipped.push_str("...");
    clipped
}
