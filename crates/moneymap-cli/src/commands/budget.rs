//! Budget command implementations

use anyhow::{Context, Result};
use moneymap_core::db::Database;
use moneymap_core::models::{BudgetRowUpdate, ExpenseEntry};
use moneymap_core::BudgetManager;

use super::{money, truncate};

pub fn cmd_budget_show(db: &Database) -> Result<()> {
    let snapshot = BudgetManager::new(db.clone()).current_snapshot()?;

    if snapshot.is_empty() {
        println!("No budget saved. Create one with:");
        println!("  moneymap budget set 3000 -e Rent=1200 -e Food=300");
        return Ok(());
    }

    println!();
    println!("💰 Budget");
    println!("   ─────────────────────────────────────────────────────────────");
    match snapshot.income {
        Some(income) => println!("   Income: {}", money(income)),
        None => println!("   Income: (not set)"),
    }
    println!();

    for category in &snapshot.categories {
        println!(
            "   [{}] {:<30} {:>12}",
            category.id,
            truncate(&category.category, 30),
            money(category.expense)
        );
    }

    let remaining = snapshot.remaining();
    let remaining_str = if remaining < 0.0 {
        format!("\x1b[31m{}\x1b[0m", money(remaining))
    } else {
        format!("\x1b[32m{}\x1b[0m", money(remaining))
    };

    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Expenses:  {}", money(snapshot.total_expenses()));
    println!("   Remaining: {}", remaining_str);

    Ok(())
}

pub fn cmd_budget_set(db: &Database, income: f64, expenses: &[ExpenseEntry]) -> Result<()> {
    BudgetManager::new(db.clone())
        .replace_snapshot(income, expenses)
        .context("Failed to save budget")?;

    let kept = expenses.iter().filter(|e| e.expense > 0.0).count();
    println!(
        "✅ Budget saved: income {}, {} categories",
        money(income),
        kept
    );
    Ok(())
}

/// Add a category row, defaulting its income to the current budget's
pub fn cmd_budget_add(
    db: &Database,
    category: &str,
    expense: f64,
    income: Option<f64>,
) -> Result<()> {
    let manager = BudgetManager::new(db.clone());
    let income = match income {
        Some(income) => income,
        None => manager.current_snapshot()?.income.unwrap_or(0.0),
    };

    let row = manager
        .upsert_category(None, income, category, expense)
        .context("Failed to add budget category")?;
    println!(
        "✅ Added '{}' ({}) [id {}]",
        row.category,
        money(row.expense),
        row.id
    );
    Ok(())
}

pub fn cmd_budget_update(db: &Database, id: i64, update: &BudgetRowUpdate) -> Result<()> {
    let row = BudgetManager::new(db.clone())
        .update_category(id, update)
        .with_context(|| format!("Failed to update budget row {}", id))?;
    println!("✅ Updated '{}' ({})", row.category, money(row.expense));
    Ok(())
}

pub fn cmd_budget_remove(db: &Database, id: i64) -> Result<()> {
    BudgetManager::new(db.clone())
        .remove_category(id)
        .with_context(|| format!("Failed to remove budget row {}", id))?;
    println!("🗑️  Removed budget row {}", id);
    Ok(())
}

pub fn cmd_budget_clear(db: &Database) -> Result<()> {
    let removed = BudgetManager::new(db.clone()).clear_all()?;
    println!("🗑️  Cleared budget ({} rows)", removed);
    Ok(())
}
