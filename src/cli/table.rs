//! Table CLI commands
//!
//! Implements CLI commands for table management, CSV import and export.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::codec::{self, TextEncoding};
use crate::display::{format_table_list, format_table_page, format_table_stats};
use crate::error::{VaultError, VaultResult};
use crate::models::{Row, Table};
use crate::services::TableService;
use crate::storage::{write_bytes_atomic, Storage};

/// Table subcommands
#[derive(Subcommand)]
pub enum TableCommands {
    /// List all tables
    List {
        /// Only show tables whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create an empty table
    Create {
        /// Table name
        name: String,
        /// Column names, comma separated
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Import a CSV file
    Import {
        /// Path to the CSV file
        file: PathBuf,
        /// Table name (defaults to the file name without extension)
        #[arg(short, long)]
        name: Option<String>,
        /// Append to an existing table of the same name
        #[arg(short, long)]
        append: bool,
        /// Field delimiter (",", ";", "tab", "|")
        #[arg(short, long)]
        delimiter: Option<String>,
        /// Text encoding (utf-8 or latin1)
        #[arg(short, long)]
        encoding: Option<String>,
        /// Line number of the header row (1 = first line)
        #[arg(long, default_value = "1")]
        header_row: usize,
    },
    /// Export a table as CSV
    Export {
        /// Table name or ID
        table: String,
        /// Output file or directory (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Field delimiter (",", ";", "tab", "|")
        #[arg(short, long)]
        delimiter: Option<String>,
    },
    /// Show the rows of a table
    Show {
        /// Table name or ID
        table: String,
        /// Page to show (1 = first page)
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Rows per page
        #[arg(long)]
        per_page: Option<usize>,
    },
    /// Show table statistics
    Stats {
        /// Table name or ID
        table: String,
    },
    /// Append a row
    AddRow {
        /// Table name or ID
        table: String,
        /// Cell values
        values: Vec<String>,
    },
    /// Replace a row
    SetRow {
        /// Table name or ID
        table: String,
        /// Zero-based row index
        index: usize,
        /// Cell values
        values: Vec<String>,
    },
    /// Delete a row
    DeleteRow {
        /// Table name or ID
        table: String,
        /// Zero-based row index
        index: usize,
    },
    /// Rename a table
    Rename {
        /// Table name or ID
        table: String,
        /// New name
        name: String,
    },
    /// Delete a table (its backups are kept)
    Delete {
        /// Table name or ID
        table: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a table command
pub fn handle_table_command(storage: &Storage, cmd: TableCommands) -> VaultResult<()> {
    let service = TableService::new(storage);
    let settings = storage.settings();

    match cmd {
        TableCommands::List { search } => {
            let tables = match search {
                Some(term) => service.search(&term)?,
                None => service.list()?,
            };
            println!("{}", format_table_list(&tables));
        }

        TableCommands::Create { name, columns } => {
            let columns = columns.into_iter().map(|c| c.trim().to_string()).collect();
            let id = service.create(&name, columns, Vec::new())?;
            println!("Created table '{}' ({})", name, id);
        }

        TableCommands::Import {
            file,
            name,
            append,
            delimiter,
            encoding,
            header_row,
        } => {
            if header_row == 0 {
                return Err(VaultError::Validation(
                    "Header row is one-based; use 1 for the first line".into(),
                ));
            }

            let name = match name {
                Some(name) => name,
                None => default_table_name(&file)?,
            };
            let delimiter =
                codec::parse_delimiter(delimiter.as_deref().unwrap_or(&settings.csv.delimiter))?;
            let encoding = match encoding {
                Some(value) => value.parse::<TextEncoding>()?,
                None => settings.csv.encoding,
            };

            let bytes = std::fs::read(&file)?;
            let rows = codec::read_rows(&bytes, encoding, delimiter, header_row - 1)?;
            let imported = rows.len().saturating_sub(1);

            let id = service.import_csv(&name, rows, append)?;
            let table = require(&service, &id.to_string())?;
            println!(
                "Imported {} row(s) into '{}' ({} rows total)",
                imported, table.name, table.row_count
            );
        }

        TableCommands::Export {
            table,
            output,
            delimiter,
        } => {
            let table = require(&service, &table)?;
            let delimiter =
                codec::parse_delimiter(delimiter.as_deref().unwrap_or(&settings.csv.delimiter))?;
            let text = codec::serialize_with(&service.export_csv(table.id)?, delimiter)?;

            match output {
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(codec::csv_file_name(
                            &table.name,
                            chrono::Local::now().date_naive(),
                        ))
                    } else {
                        path
                    };
                    write_bytes_atomic(&path, text.as_bytes())?;
                    println!("Exported {} row(s) to {}", table.row_count, path.display());
                }
                None => print!("{}", text),
            }
        }

        TableCommands::Show {
            table,
            page,
            per_page,
        } => {
            let table = require(&service, &table)?;
            let per_page = per_page.unwrap_or(settings.page_size);
            let view = service.page(table.id, page.saturating_sub(1), per_page)?;
            print!("{}", format_table_page(&table.name, &view));
        }

        TableCommands::Stats { table } => {
            let table = require(&service, &table)?;
            print!("{}", format_table_stats(&service.stats(table.id)?));
        }

        TableCommands::AddRow { table, values } => {
            let table = require(&service, &table)?;
            service.append_rows(table.id, vec![to_row(values)])?;
            println!("Added row {} to '{}'", table.row_count, table.name);
        }

        TableCommands::SetRow {
            table,
            index,
            values,
        } => {
            let table = require(&service, &table)?;
            service.set_row(table.id, index, to_row(values))?;
            println!("Updated row {} of '{}'", index, table.name);
        }

        TableCommands::DeleteRow { table, index } => {
            let table = require(&service, &table)?;
            service.delete_row(table.id, index)?;
            println!("Deleted row {} of '{}'", index, table.name);
        }

        TableCommands::Rename { table, name } => {
            let table = require(&service, &table)?;
            service.rename(table.id, &name)?;
            println!("Renamed '{}' to '{}'", table.name, name);
        }

        TableCommands::Delete { table, force } => {
            let table = require(&service, &table)?;

            if !force {
                println!(
                    "This will delete table '{}' with {} row(s). Backups are kept.",
                    table.name, table.row_count
                );
                println!("To proceed, run again with --force flag:");
                println!("  tablevault table delete \"{}\" --force", table.name);
                return Ok(());
            }

            service.delete(table.id)?;
            println!("Deleted table '{}'", table.name);
        }
    }

    Ok(())
}

/// Resolve a table by name or ID, failing if it does not exist
pub(crate) fn require(service: &TableService<'_>, identifier: &str) -> VaultResult<Table> {
    service
        .find(identifier)?
        .ok_or_else(|| VaultError::table_not_found(identifier))
}

fn to_row(values: Vec<String>) -> Row {
    values.into_iter().map(Some).collect()
}

fn default_table_name(file: &Path) -> VaultResult<String> {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            VaultError::Validation(format!(
                "Cannot derive a table name from {}; pass --name",
                file.display()
            ))
        })
}
