//! Display formatting for terminal output
//!
//! Provides utilities for formatting tables and backups for terminal
//! display as aligned text grids.

pub mod backup;
pub mod table;

pub use backup::{format_backup_details, format_backup_list};
pub use table::{format_table_list, format_table_page, format_table_stats};
