//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use moneymap_core::models::{ExpenseEntry, GoalFrequency, TransactionStatus};

/// MoneyMap - Local personal finance ledger
#[derive(Parser)]
#[command(name = "moneymap")]
#[command(about = "Track transactions, goals and budgets in a local ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory holding database.sqlite
    ///
    /// Defaults to $MONEYMAP_DATA_DIR, then the platform data directory.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to <data-dir>/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and database
    Init,

    /// Show storage location and record counts
    Status,

    /// Manage transactions (list, add, update, delete)
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Manage financial goals (list, add, update, delete)
    Goals {
        #[command(subcommand)]
        action: Option<GoalsAction>,
    },

    /// Manage the budget (show, set, add, update, remove, clear)
    Budget {
        #[command(subcommand)]
        action: Option<BudgetAction>,
    },

    /// Export goals, budget and transactions as one JSON document
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail if any domain could not be exported
        #[arg(long)]
        strict: bool,
    },

    /// Invoke a desktop IPC channel directly (e.g. get-goals, save-budget)
    Call {
        /// Channel name
        channel: String,

        /// Positional arguments as JSON (bare words are passed as strings)
        args: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List all transactions
    List,

    /// Log a transaction
    Add {
        /// Description
        name: String,

        /// Amount (always positive; direction comes from --status)
        amount: f64,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// income or expense
        #[arg(short, long, default_value = "expense")]
        status: TransactionStatus,
    },

    /// Edit a transaction
    Update {
        /// Transaction ID
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        amount: Option<f64>,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        status: Option<TransactionStatus>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum GoalsAction {
    /// List all goals
    List,

    /// Add a goal
    Add {
        /// Goal name
        name: String,

        /// Amount to reach
        #[arg(short, long)]
        target: f64,

        /// Category (e.g. Savings, Travel)
        #[arg(short, long)]
        category: String,

        /// Date to reach the target by (YYYY-MM-DD)
        #[arg(long)]
        by: NaiveDate,

        /// Recurring goal funded by regular income
        #[arg(long)]
        recurring: bool,

        /// Income put toward a recurring goal each period
        #[arg(long)]
        income: Option<f64>,

        /// daily, weekly, monthly or quarterly
        #[arg(long)]
        frequency: Option<GoalFrequency>,
    },

    /// Edit a goal
    Update {
        /// Goal ID
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        target: Option<f64>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        by: Option<NaiveDate>,

        #[arg(long)]
        recurring: Option<bool>,

        #[arg(long)]
        income: Option<f64>,

        #[arg(long)]
        frequency: Option<GoalFrequency>,
    },

    /// Delete a goal
    Delete {
        /// Goal ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Show the current budget
    Show,

    /// Replace the whole budget with a new income and expense list
    Set {
        /// Monthly income
        income: f64,

        /// Category expense as Category=Amount (repeatable)
        #[arg(short, long = "expense", value_parser = parse_expense)]
        expenses: Vec<ExpenseEntry>,
    },

    /// Add one category to the current budget
    Add {
        /// Category name
        category: String,

        /// Planned expense
        expense: f64,

        /// Income recorded on the row (defaults to the current budget income)
        #[arg(long)]
        income: Option<f64>,
    },

    /// Edit one category row
    Update {
        /// Budget row ID
        id: i64,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        expense: Option<f64>,
    },

    /// Remove one category row
    Remove {
        /// Budget row ID
        id: i64,
    },

    /// Delete the whole budget
    Clear,
}

/// Parse `Category=Amount`
pub fn parse_expense(s: &str) -> Result<ExpenseEntry, String> {
    let (category, amount) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected Category=Amount, got '{}'", s))?;
    let expense = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid amount '{}': {}", amount, e))?;
    Ok(ExpenseEntry::new(category.trim(), expense))
}
