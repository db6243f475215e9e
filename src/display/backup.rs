//! Backup display formatting

use crate::models::Backup;

/// Format a list of backups as a table
pub fn format_backup_list(backups: &[Backup]) -> String {
    if backups.is_empty() {
        return "No backups found.".to_string();
    }

    let table_width = backups
        .iter()
        .map(|b| b.table_name.chars().count())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<table_width$}  {:<19}  {:>8}  {}\n",
        "ID",
        "Table",
        "Created",
        "Rows",
        "Description",
        table_width = table_width,
    ));
    output.push_str(&format!(
        "{:-<12}  {:-<table_width$}  {:-<19}  {:->8}  {:-<11}\n",
        "",
        "",
        "",
        "",
        "",
        table_width = table_width,
    ));

    for backup in backups {
        output.push_str(&format!(
            "{:<12}  {:<table_width$}  {:<19}  {:>8}  {}\n",
            backup.id.to_string(),
            backup.table_name,
            backup.timestamp.format("%Y-%m-%d %H:%M:%S"),
            backup.row_count,
            backup.description,
            table_width = table_width,
        ));
    }

    output.push_str(&format!("\n{} backup(s)\n", backups.len()));
    output
}

/// Format a single backup's details
pub fn format_backup_details(backup: &Backup) -> String {
    let mut output = String::new();

    output.push_str(&format!("Backup: {}\n", backup.id));
    output.push_str(&format!("  Table:       {}\n", backup.table_name));
    output.push_str(&format!("  Table ID:    {}\n", backup.table_id));
    output.push_str(&format!(
        "  Created:     {}\n",
        backup.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("  Rows:        {}\n", backup.row_count));
    output.push_str(&format!("  Columns:     {}\n", backup.columns.join(", ")));
    output.push_str(&format!("  Version:     {}\n", backup.version));

    if !backup.description.is_empty() {
        output.push_str(&format!("  Description: {}\n", backup.description));
    }

    output
}
