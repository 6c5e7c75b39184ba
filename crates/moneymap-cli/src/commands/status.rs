//! Status command implementation

use std::fs;

use anyhow::Result;
use moneymap_core::{Config, Database};

use super::open_db;

pub fn cmd_status(config: &Config) -> Result<()> {
    let db_path = config.db_path();

    println!();
    println!("📊 MoneyMap Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Data directory: {}", config.data_dir.display());
    println!("   Database: {}", db_path.display());

    if !db_path.exists() {
        println!("   Size: (database not initialized)");
        println!();
        println!("   Run 'moneymap init' to create it.");
        return Ok(());
    }

    let db = match open_db(config) {
        Ok(db) => db,
        Err(e) => {
            println!("   ❌ Could not open database: {:#}", e);
            return Ok(());
        }
    };

    if let Some(size) = db_size(&db) {
        let size_kb = size as f64 / 1024.0;
        if size_kb < 1024.0 {
            println!("   Size: {:.1} KB", size_kb);
        } else {
            println!("   Size: {:.1} MB", size_kb / 1024.0);
        }
    }

    match db.stats() {
        Ok(stats) => {
            println!();
            println!("   Transactions: {}", stats.transactions);
            println!("   Goals:        {}", stats.goals);
            println!("   Budget rows:  {}", stats.budget_rows);
        }
        Err(e) => {
            println!("   ❌ Could not read database: {:#}", e);
        }
    }

    Ok(())
}

/// Bytes on disk for the opened database, write-ahead log included
pub fn db_size(db: &Database) -> Option<u64> {
    let path = db.path();
    let main = fs::metadata(path).ok()?.len();
    let mut wal = path.as_os_str().to_owned();
    wal.push("-wal");
    let wal = fs::metadata(&wal).map(|m| m.len()).unwrap_or(0);
    Some(main + wal)
}
