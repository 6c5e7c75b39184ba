//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `load_config` - Resolve the data directory and config file
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use moneymap_core::{Config, Database};

/// Resolve configuration from flags, environment and config file
pub fn load_config(data_dir: Option<&Path>, config_path: Option<&Path>) -> Result<Config> {
    Config::load(data_dir, config_path).context("Failed to load configuration")
}

/// Open (and if needed create) the database
pub fn open_db(config: &Config) -> Result<Database> {
    Database::open(config)
        .with_context(|| format!("Failed to open database at {}", config.db_path().display()))
}

pub fn cmd_init(config: &Config) -> Result<()> {
    println!("🔧 Initializing database at {}...", config.db_path().display());

    let db = open_db(config)?;
    let stats = db.stats().context("Failed to read database")?;

    println!("✅ Database initialized at {}", db.path().display());
    println!(
        "   {} transactions, {} goals, {} budget rows",
        stats.transactions, stats.goals, stats.budget_rows
    );
    println!();
    println!("Next steps:");
    println!("  1. Log a transaction: moneymap transactions add Paycheck 2500 --status income");
    println!("  2. Set a budget:      moneymap budget set 3000 -e Rent=1200 -e Food=300");

    Ok(())
}
