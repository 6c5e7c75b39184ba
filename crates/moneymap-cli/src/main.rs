//! MoneyMap CLI - Local personal finance ledger
//!
//! Usage:
//!   moneymap init                          Create the database
//!   moneymap transactions add Rent 1200    Log a transaction
//!   moneymap budget set 3000 -e Rent=1200  Replace the budget
//!   moneymap export --output ledger.json   Export everything as JSON

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use moneymap_core::models::{BudgetRowUpdate, GoalUpdate, NewGoal, TransactionUpdate};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config = commands::load_config(cli.data_dir.as_deref(), cli.config.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&config),
        Commands::Status => commands::cmd_status(&config),
        Commands::Transactions { action } => {
            let db = commands::open_db(&config)?;
            match action {
                None | Some(TransactionsAction::List) => commands::cmd_transactions_list(&db),
                Some(TransactionsAction::Add {
                    name,
                    amount,
                    date,
                    status,
                }) => commands::cmd_transactions_add(&db, &name, amount, date, status),
                Some(TransactionsAction::Update {
                    id,
                    name,
                    amount,
                    date,
                    status,
                }) => commands::cmd_transactions_update(
                    &db,
                    id,
                    &TransactionUpdate {
                        name,
                        date,
                        status,
                        amount,
                    },
                ),
                Some(TransactionsAction::Delete { id }) => {
                    commands::cmd_transactions_delete(&db, id)
                }
            }
        }
        Commands::Goals { action } => {
            let db = commands::open_db(&config)?;
            match action {
                None | Some(GoalsAction::List) => commands::cmd_goals_list(&db),
                Some(GoalsAction::Add {
                    name,
                    target,
                    category,
                    by,
                    recurring,
                    income,
                    frequency,
                }) => commands::cmd_goals_add(
                    &db,
                    &NewGoal {
                        name,
                        target_amount: target,
                        category,
                        recurring,
                        income_amount: income,
                        frequency,
                        target_date: by,
                    },
                ),
                Some(GoalsAction::Update {
                    id,
                    name,
                    target,
                    category,
                    by,
                    recurring,
                    income,
                    frequency,
                }) => commands::cmd_goals_update(
                    &db,
                    id,
                    &GoalUpdate {
                        name,
                        target_amount: target,
                        category,
                        recurring,
                        income_amount: income,
                        frequency,
                        target_date: by,
                    },
                ),
                Some(GoalsAction::Delete { id }) => commands::cmd_goals_delete(&db, id),
            }
        }
        Commands::Budget { action } => {
            let db = commands::open_db(&config)?;
            match action {
                None | Some(BudgetAction::Show) => commands::cmd_budget_show(&db),
                Some(BudgetAction::Set { income, expenses }) => {
                    commands::cmd_budget_set(&db, income, &expenses)
                }
                Some(BudgetAction::Add {
                    category,
                    expense,
                    income,
                }) => commands::cmd_budget_add(&db, &category, expense, income),
                Some(BudgetAction::Update {
                    id,
                    category,
                    expense,
                }) => commands::cmd_budget_update(
                    &db,
                    id,
                    &BudgetRowUpdate {
                        income: None,
                        category,
                        expense,
                    },
                ),
                Some(BudgetAction::Remove { id }) => commands::cmd_budget_remove(&db, id),
                Some(BudgetAction::Clear) => commands::cmd_budget_clear(&db),
            }
        }
        Commands::Export { output, strict } => {
            let db = commands::open_db(&config)?;
            commands::cmd_export(&db, output.as_deref(), strict).await
        }
        Commands::Call { channel, args } => {
            let db = commands::open_db(&config)?;
            commands::cmd_call(&db, &channel, &args).await
        }
    }
}
