//! User settings for tablevault
//!
//! Manages preferences including backup retention, the auto-backup interval
//! and CSV import defaults.

use serde::{Deserialize, Serialize};

use super::paths::VaultPaths;
use crate::codec::TextEncoding;
use crate::error::VaultError;
use crate::storage::write_json_atomic;

/// Backup retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of most recent backups to keep per table
    pub keep_per_table: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self { keep_per_table: 7 }
    }
}

/// Auto-backup scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoBackupSettings {
    /// Hours between automatic backups
    pub interval_hours: u64,
}

impl Default for AutoBackupSettings {
    fn default() -> Self {
        Self { interval_hours: 24 }
    }
}

/// CSV import defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSettings {
    /// Field delimiter (",", ";", "tab", "|")
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Text encoding of imported files
    #[serde(default)]
    pub encoding: TextEncoding,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            encoding: TextEncoding::default(),
        }
    }
}

/// User settings for tablevault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Backup retention policy
    #[serde(default)]
    pub backup_retention: BackupRetention,

    /// Auto-backup schedule
    #[serde(default)]
    pub auto_backup: AutoBackupSettings,

    /// CSV import defaults
    #[serde(default)]
    pub csv: CsvSettings,

    /// Rows per page when showing a table
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Fallback tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_page_size() -> usize {
    50
}

fn default_log_filter() -> String {
    "tablevault=info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup_retention: BackupRetention::default(),
            auto_backup: AutoBackupSettings::default(),
            csv: CsvSettings::default(),
            page_size: default_page_size(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &VaultPaths) -> Result<Self, VaultError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| VaultError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                VaultError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &VaultPaths) -> Result<(), VaultError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.backup_retention.keep_per_table, 7);
        assert_eq!(settings.auto_backup.interval_hours, 24);
        assert_eq!(settings.csv.delimiter, ",");
        assert_eq!(settings.csv.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_save_replaces_file_atomically() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "{ not json").unwrap();

        let mut settings = Settings::default();
        settings.page_size = 10;
        settings.save(&paths).unwrap();

        assert!(!temp_dir.path().join("config.json.tmp").exists());
        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.page_size, 10);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.backup_retention.keep_per_table = 3;
        settings.csv.delimiter = ";".into();

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.backup_retention.keep_per_table, 3);
        assert_eq!(loaded.csv.delimiter, ";");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();

        std::fs::write(paths.settings_file(), r#"{"page_size": 10}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.page_size, 10);
        assert_eq!(loaded.backup_retention.keep_per_table, 7);
        assert_eq!(loaded.log_filter, "tablevault=info");
    }
}
