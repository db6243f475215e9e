//! tablevault - Local store for tabular datasets and their backups
//!
//! This library keeps named tables imported from CSV files in a local JSON
//! store, together with point-in-time backups of those tables. It provides
//! table CRUD, row-level edits, CSV round-tripping and a retention policy
//! for automatic backups.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (tables, backups, IDs)
//! - `storage`: JSON file storage layer and per-table locks
//! - `codec`: CSV parsing, serialization and text decoding
//! - `backup`: Retention, snapshot files and the auto-backup scheduler
//! - `services`: Business logic layer
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use tablevault::config::{paths::VaultPaths, settings::Settings};
//! use tablevault::services::TableService;
//! use tablevault::storage::Storage;
//!
//! let paths = VaultPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths, settings)?;
//!
//! let tables = TableService::new(&storage);
//! let id = tables.create("orders", vec!["id".into(), "amt".into()], vec![])?;
//! ```

pub mod backup;
pub mod cli;
pub mod codec;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{VaultError, VaultResult};
