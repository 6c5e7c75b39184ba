//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `budget` - Budget commands (show, set, add, update, remove, clear)
//! - `call` - Raw IPC channel invocation
//! - `core` - Init command and shared utilities (load_config, open_db)
//! - `export` - Aggregated JSON export
//! - `goals` - Financial goal commands
//! - `status` - Storage status
//! - `transactions` - Transaction commands

pub mod budget;
pub mod call;
pub mod core;
pub mod export;
pub mod goals;
pub mod status;
pub mod transactions;

// Re-export command functions for main.rs
pub use budget::*;
pub use call::*;
pub use core::*;
pub use export::*;
pub use goals::*;
pub use status::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount as dollars
pub fn money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}
