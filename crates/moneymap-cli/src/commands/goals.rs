//! Financial goal command implementations

use anyhow::{bail, Context, Result};
use chrono::Local;
use moneymap_core::db::Database;
use moneymap_core::models::{GoalUpdate, NewGoal};

use super::{money, truncate};

pub fn cmd_goals_list(db: &Database) -> Result<()> {
    let goals = db.list_goals()?;

    if goals.is_empty() {
        println!("No goals yet. Add one with:");
        println!("  moneymap goals add \"Emergency fund\" --target 5000 --category Savings --by 2025-12-31");
        return Ok(());
    }

    let today = Local::now().date_naive();

    println!();
    println!("🎯 Financial Goals");
    println!("   ─────────────────────────────────────────────────────────────");

    for goal in goals {
        let days_left = (goal.target_date - today).num_days();
        let when = if days_left >= 0 {
            format!("{} ({} days left)", goal.target_date, days_left)
        } else {
            format!("{} (past due)", goal.target_date)
        };

        println!(
            "   [{}] {:<30} {:>12} │ {} │ {}",
            goal.id,
            truncate(&goal.name, 30),
            money(goal.target_amount),
            goal.category,
            when
        );

        if goal.recurring {
            match (goal.income_amount, goal.frequency) {
                (Some(income), Some(frequency)) => {
                    println!("        ↻ {} {}", money(income), frequency)
                }
                (Some(income), None) => println!("        ↻ {} per period", money(income)),
                _ => println!("        ↻ recurring"),
            }
        }
    }

    Ok(())
}

pub fn cmd_goals_add(db: &Database, goal: &NewGoal) -> Result<()> {
    let goal = db.create_goal(goal).context("Failed to add goal")?;
    println!(
        "✅ Added goal '{}' ({} by {}) [id {}]",
        goal.name,
        money(goal.target_amount),
        goal.target_date,
        goal.id
    );
    Ok(())
}

pub fn cmd_goals_update(db: &Database, id: i64, update: &GoalUpdate) -> Result<()> {
    if !db.update_goal(id, update)? {
        bail!("Goal {} not found", id);
    }
    println!("✅ Updated goal {}", id);
    Ok(())
}

pub fn cmd_goals_delete(db: &Database, id: i64) -> Result<()> {
    if !db.delete_goal(id)? {
        bail!("Goal {} not found", id);
    }
    println!("🗑️  Deleted goal {}", id);
    Ok(())
}
