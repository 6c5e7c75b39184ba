//! Error types for MoneyMap

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// The data directory or database file is unusable
    #[error("Storage initialization failed: {0}")]
    StorageInit(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A budget snapshot replace was rolled back
    #[error("Budget snapshot not saved: {0}")]
    Snapshot(String),

    /// Some export domains failed while others succeeded
    #[error("Export incomplete, failed domains: {}", .0.join(", "))]
    PartialExport(Vec<String>),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl Error {
    /// Stable tag for the error category, reported across the operation boundary
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Pool(_) | Self::Io(_) => "storage",
            Self::Json(_) | Self::Validation(_) => "validation",
            Self::Config(_) => "config",
            Self::StorageInit(_) => "storage_init",
            Self::NotFound(_) => "not_found",
            Self::Snapshot(_) => "snapshot",
            Self::PartialExport(_) => "partial_export",
            Self::Export(_) => "export",
            Self::Task(_) => "task",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
