//! Storage configuration
//!
//! Resolution order for the data directory: explicit override (CLI flag),
//! then `MONEYMAP_DATA_DIR`, then the platform data directory. Tunables are
//! read from an optional `config.toml`:
//!
//! ```toml
//! db_file = "database.sqlite"
//! pool_size = 4
//! busy_timeout_ms = 5000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "MONEYMAP_DATA_DIR";

/// Config file name looked up inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_DB_FILE: &str = "database.sqlite";
const DEFAULT_POOL_SIZE: u32 = 4;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Resolved storage configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the database file
    pub data_dir: PathBuf,
    /// Database file name within `data_dir`
    pub db_file: String,
    /// Maximum pooled SQLite connections
    pub pool_size: u32,
    /// How long a connection waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Config {
    /// Configuration rooted at `data_dir` with default tunables
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            db_file: DEFAULT_DB_FILE.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// Load configuration from the environment and an optional config file
    ///
    /// `config_path` defaults to `<data_dir>/config.toml`; a missing file
    /// means defaults, an unreadable or malformed one is an error.
    pub fn load(data_dir: Option<&Path>, config_path: Option<&Path>) -> Result<Self> {
        let env_dir = std::env::var(DATA_DIR_ENV).ok();
        let data_dir = resolve_data_dir(data_dir, env_dir.as_deref());

        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join(CONFIG_FILE));

        let mut config = Self::with_data_dir(data_dir);

        if config_path.exists() {
            let content = fs::read_to_string(&config_path).map_err(|e| {
                Error::Config(format!(
                    "Failed to read {}: {}",
                    config_path.display(),
                    e
                ))
            })?;
            config.apply(parse_config(&content)?)?;
            debug!(path = %config_path.display(), "Loaded config file");
        }

        Ok(config)
    }

    /// Full path to the database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    fn apply(&mut self, raw: RawConfig) -> Result<()> {
        if let Some(db_file) = raw.db_file {
            if db_file.trim().is_empty() {
                return Err(Error::Config("db_file must not be empty".to_string()));
            }
            self.db_file = db_file;
        }
        if let Some(pool_size) = raw.pool_size {
            if pool_size == 0 {
                return Err(Error::Config("pool_size must be at least 1".to_string()));
            }
            self.pool_size = pool_size;
        }
        if let Some(timeout) = raw.busy_timeout_ms {
            self.busy_timeout_ms = timeout;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_dir(default_data_dir())
    }
}

/// Platform data directory for the app (e.g. `~/.local/share/MoneyMap`)
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("MoneyMap")
}

fn resolve_data_dir(explicit: Option<&Path>, env_value: Option<&str>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    match env_value {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => default_data_dir(),
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    db_file: Option<String>,
    pool_size: Option<u32>,
    busy_timeout_ms: Option<u64>,
}

fn parse_config(content: &str) -> Result<RawConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
}
