use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tablevault::cli::{handle_backup_command, handle_table_command};
use tablevault::config::{paths::VaultPaths, settings::Settings};
use tablevault::storage::Storage;

#[derive(Parser)]
#[command(
    name = "tablevault",
    version,
    about = "Local store for CSV tables with point-in-time backups",
    long_about = "tablevault keeps tables imported from CSV files in a local store, \
                  lets you edit them row by row, export them again, and takes \
                  backups that can be restored, exported and pruned."
)]
struct Cli {
    /// Use this directory instead of the default data location
    #[arg(long, global = true, env = "TABLEVAULT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Table management commands
    #[command(subcommand)]
    Table(tablevault::cli::TableCommands),

    /// Backup management commands
    #[command(subcommand)]
    Backup(tablevault::cli::BackupCommands),

    /// Show current configuration and paths
    Config {
        /// Write the current settings to the settings file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = match cli.data_dir {
        Some(dir) => VaultPaths::with_base_dir(dir),
        None => VaultPaths::new()?,
    };
    let settings = Settings::load_or_create(&paths)?;

    init_tracing(&settings.log_filter);

    // Open storage
    let storage = Arc::new(Storage::open(paths.clone(), settings.clone())?);

    match cli.command {
        Some(Commands::Table(cmd)) => {
            handle_table_command(&storage, cmd)?;
        }
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(Arc::clone(&storage), cmd).await?;
        }
        Some(Commands::Config { save }) => {
            if save {
                settings.save(&paths)?;
                println!("Settings written to {}", paths.settings_file().display());
                println!();
            }

            println!("tablevault Configuration");
            println!("========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Export directory: {}", paths.export_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!(
                "  Backups kept per table: {}",
                settings.backup_retention.keep_per_table
            );
            println!(
                "  Auto-backup interval:   {} hour(s)",
                settings.auto_backup.interval_hours
            );
            println!("  CSV delimiter:          {:?}", settings.csv.delimiter);
            println!("  CSV encoding:           {}", settings.csv.encoding);
            println!("  Rows per page:          {}", settings.page_size);
            println!("  Log filter:             {}", settings.log_filter);
        }
        None => {
            println!("tablevault - CSV tables with point-in-time backups");
            println!();
            println!("Run 'tablevault --help' for usage information.");
        }
    }

    storage.shutdown();
    Ok(())
}

fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
