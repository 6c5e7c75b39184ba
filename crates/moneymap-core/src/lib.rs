//! MoneyMap Core Library
//!
//! Local ledger store for the MoneyMap personal finance app:
//! - SQLite storage with additive schema evolution
//! - Transaction, financial goal and budget row repositories
//! - Atomic budget snapshot replacement
//! - Aggregated export of all domains
//! - The `{success, ...}` operation boundary consumed by the desktop UI

pub mod api;
pub mod budget;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;

pub use api::{ApiResponse, Ledger};
pub use budget::BudgetManager;
pub use config::Config;
pub use db::{Database, StoreStats};
pub use error::{Error, Result};
pub use export::{AggregatedExport, DomainExport, Exporter};
