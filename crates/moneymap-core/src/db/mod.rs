//! Database access layer with connection pooling and schema evolution
//!
//! This module is organized by domain:
//! - `transactions` - Transaction CRUD
//! - `goals` - Financial goal CRUD
//! - `budgets` - Budget row CRUD (the grouped view lives in `crate::budget`)
//!
//! All writes go through [`Database::run_transaction`], which serializes
//! writers in-process and commits durably before returning.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::ANCHOR_CATEGORY;

mod budgets;
mod column_updates;
mod goals;
mod transactions;

pub(crate) use budgets::{clear_budget_rows, insert_budget_row};
pub(crate) use column_updates::{delete_row, ColumnUpdates};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Column declaration used for the timestamp pair on every table
const TIMESTAMP: &str = "DATETIME";

/// A table and its current column set (besides the `id` primary key)
///
/// Declarations must be valid for `ALTER TABLE ADD COLUMN`, so NOT NULL
/// columns carry a constant default.
struct TableDef {
    name: &'static str,
    columns: &'static [(&'static str, &'static str)],
}

const TABLES: &[TableDef] = &[
    TableDef {
        name: "transactions",
        columns: &[
            ("name", "TEXT NOT NULL DEFAULT ''"),
            ("date", "TEXT NOT NULL DEFAULT ''"),
            ("status", "TEXT NOT NULL DEFAULT 'Expense'"),
            ("amount", "REAL NOT NULL DEFAULT 0"),
            ("created_at", TIMESTAMP),
            ("updated_at", TIMESTAMP),
        ],
    },
    TableDef {
        name: "financial_goals",
        columns: &[
            ("name", "TEXT NOT NULL DEFAULT ''"),
            ("target_amount", "REAL NOT NULL DEFAULT 0"),
            ("category", "TEXT NOT NULL DEFAULT ''"),
            ("recurring", "INTEGER NOT NULL DEFAULT 0"),
            ("income_amount", "REAL"),
            ("frequency", "TEXT"),
            ("target_date", "TEXT NOT NULL DEFAULT ''"),
            ("created_at", TIMESTAMP),
            ("updated_at", TIMESTAMP),
        ],
    },
    TableDef {
        name: "budgets",
        columns: &[
            ("income", "REAL NOT NULL DEFAULT 0"),
            ("category", "TEXT NOT NULL DEFAULT ''"),
            ("expense", "REAL NOT NULL DEFAULT 0"),
            ("created_at", TIMESTAMP),
            ("updated_at", TIMESTAMP),
        ],
    },
];

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: Option<String>) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    s.and_then(|s| chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok())
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}

/// Parse a stored `YYYY-MM-DD` date, falling back to the epoch default
///
/// Listing keeps working over a row written by another tool; the bad value
/// is logged with its row so it can be repaired.
pub(crate) fn parse_stored_date(table: &str, id: i64, raw: &str) -> chrono::NaiveDate {
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_else(|e| {
        warn!(table, id, raw, error = %e, "Unparseable stored date, using default");
        chrono::NaiveDate::default()
    })
}

/// Reject blank required text fields
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Reject NaN and infinite amounts
pub(crate) fn require_finite(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::Validation(format!("{} must be a finite number", field)));
    }
    Ok(())
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub transactions: i64,
    pub goals: i64,
    pub budget_rows: i64,
}

/// Database wrapper with connection pooling
///
/// Cheap to clone; clones share the pool and the write lock.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Open (creating if needed) the database described by `config`
    ///
    /// Any failure here is a [`Error::StorageInit`]: the data directory or
    /// file could not be created, opened or brought up to the current schema.
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            Error::StorageInit(format!(
                "Failed to create data directory {}: {}",
                config.data_dir.display(),
                e
            ))
        })?;

        let db_path = config.db_path();

        // Probe with a plain connection first so an unusable file fails fast
        // instead of waiting out the pool's connection timeout.
        let probe = Connection::open(&db_path).map_err(|e| {
            Error::StorageInit(format!("Failed to open {}: {}", db_path.display(), e))
        })?;
        // WAL: readers never observe an uncommitted write and don't block the writer
        probe
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
            .map_err(|e| {
                Error::StorageInit(format!("Failed to configure {}: {}", db_path.display(), e))
            })?;
        drop(probe);

        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let manager = SqliteConnectionManager::file(&db_path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            // FULL: a commit is on disk before the call returns
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA synchronous = FULL;")?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .build(manager)
            .map_err(|e| Error::StorageInit(format!("Failed to build connection pool: {}", e)))?;

        let db = Self {
            pool,
            db_path,
            write_lock: Arc::new(Mutex::new(())),
        };
        db.initialize().map_err(|e| match e {
            Error::StorageInit(_) => e,
            other => Error::StorageInit(format!("Schema setup failed: {}", other)),
        })?;

        info!(path = %db.db_path.display(), "Database ready");
        Ok(db)
    }

    /// Open a database file at an explicit path with default tunables
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::StorageInit(format!("Invalid database path: {}", path.display()))
            })?;
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut config = Config::with_data_dir(parent);
        config.db_file = file_name.to_string();
        Self::open(&config)
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a uniquely named temporary file rather than `:memory:` so every
    /// pooled connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir();
        let file = format!("moneymap_test_{}_{}.db", std::process::id(), id);

        // Remove any leftovers from an earlier run with the same pid
        for suffix in ["", "-wal", "-shm"] {
            let _ = fs::remove_file(dir.join(format!("{}{}", file, suffix)));
        }

        let mut config = Config::with_data_dir(dir);
        config.db_file = file;
        Self::open(&config)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run a unit of work as one atomic transaction
    ///
    /// Every write inside `work` commits together or not at all: an `Err`
    /// from the closure (or a failing statement) rolls the whole unit back
    /// and is returned unchanged. Writers are serialized, so there is never
    /// more than one open write transaction in this process.
    ///
    /// `work` only gets the transaction handle; it must not call back into
    /// this `Database` for writes (there are no nested transactions).
    pub fn run_transaction<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    {
        // The lock guards no data, so a poisoned lock is still usable
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match work(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                // Dropping the transaction rolls it back
                drop(tx);
                debug!(error = %e, "Transaction rolled back");
                Err(e)
            }
        }
    }

    /// Create or evolve the schema to match the current table definitions
    ///
    /// Additive only: missing tables are created and missing columns are
    /// appended; nothing is dropped or rewritten. Safe to call repeatedly.
    pub fn initialize(&self) -> Result<()> {
        self.run_transaction(|tx| {
            for table in TABLES {
                let column_defs = table
                    .columns
                    .iter()
                    .map(|(name, decl)| format!("{} {}", name, decl))
                    .collect::<Vec<_>>()
                    .join(", ");
                tx.execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY AUTOINCREMENT, {});",
                    table.name, column_defs
                ))?;

                let existing = table_columns(tx, table.name)?;
                for (column, decl) in table.columns {
                    if existing.iter().any(|c| c == column) {
                        continue;
                    }

                    tx.execute_batch(&format!(
                        "ALTER TABLE {} ADD COLUMN {} {};",
                        table.name, column, decl
                    ))?;
                    if *decl == TIMESTAMP {
                        tx.execute(
                            &format!(
                                "UPDATE {} SET {} = CURRENT_TIMESTAMP WHERE {} IS NULL",
                                table.name, column, column
                            ),
                            [],
                        )?;
                    }
                    info!(table = table.name, column, "Added missing column");
                }
            }

            ensure_anchor_index(tx)?;
            Ok(())
        })?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Row counts for each ledger table
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?)
        };

        Ok(StoreStats {
            transactions: count("transactions")?,
            goals: count("financial_goals")?,
            budget_rows: count("budgets")?,
        })
    }
}

/// Column names currently present on `table`
fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map(params![table], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(columns)
}

/// At most one anchor row may exist
///
/// Files written before the index existed may already hold several anchors;
/// those are left alone (and the index skipped) rather than deleting data.
fn ensure_anchor_index(conn: &Connection) -> Result<()> {
    let anchors: i64 = conn.query_row(
        "SELECT COUNT(*) FROM budgets WHERE category = ?1",
        params![ANCHOR_CATEGORY],
        |row| row.get(0),
    )?;

    if anchors > 1 {
        warn!(
            anchors,
            "Multiple budget anchor rows found; single-anchor index not created"
        );
        return Ok(());
    }

    conn.execute_batch(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_budgets_single_anchor ON budgets(category) WHERE category = '{}';",
        ANCHOR_CATEGORY
    ))?;
    Ok(())
}
