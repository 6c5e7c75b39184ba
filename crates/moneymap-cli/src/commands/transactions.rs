//! Transaction command implementations

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use moneymap_core::db::Database;
use moneymap_core::models::{NewTransaction, TransactionStatus, TransactionUpdate};

use super::{money, truncate};

pub fn cmd_transactions_list(db: &Database) -> Result<()> {
    let transactions = db.list_transactions()?;

    if transactions.is_empty() {
        println!("No transactions found. Log one with:");
        println!("  moneymap transactions add Groceries 82.50");
        return Ok(());
    }

    println!();
    println!("📝 Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    let mut net = 0.0;
    for tx in &transactions {
        let amount_str = match tx.status {
            TransactionStatus::Expense => {
                net -= tx.amount;
                format!("\x1b[31m-{}\x1b[0m", money(tx.amount)) // Red for expenses
            }
            TransactionStatus::Income => {
                net += tx.amount;
                format!("\x1b[32m+{}\x1b[0m", money(tx.amount)) // Green for income
            }
        };

        println!(
            "   [{}] {} │ {:>12} │ {}",
            tx.id,
            tx.date,
            amount_str,
            truncate(&tx.name, 40)
        );
    }

    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {} transactions, net {}", transactions.len(), money(net));

    Ok(())
}

pub fn cmd_transactions_add(
    db: &Database,
    name: &str,
    amount: f64,
    date: Option<NaiveDate>,
    status: TransactionStatus,
) -> Result<()> {
    let tx = db
        .create_transaction(&NewTransaction {
            name: name.to_string(),
            date: date.unwrap_or_else(|| Local::now().date_naive()),
            status,
            amount,
        })
        .context("Failed to log transaction")?;

    println!(
        "✅ Logged {} '{}' ({}) on {} [id {}]",
        tx.status.as_str().to_lowercase(),
        tx.name,
        money(tx.amount),
        tx.date,
        tx.id
    );
    Ok(())
}

pub fn cmd_transactions_update(db: &Database, id: i64, update: &TransactionUpdate) -> Result<()> {
    if !db.update_transaction(id, update)? {
        bail!("Transaction {} not found", id);
    }
    println!("✅ Updated transaction {}", id);
    Ok(())
}

pub fn cmd_transactions_delete(db: &Database, id: i64) -> Result<()> {
    if !db.delete_transaction(id)? {
        bail!("Transaction {} not found", id);
    }
    println!("🗑️  Deleted transaction {}", id);
    Ok(())
}
