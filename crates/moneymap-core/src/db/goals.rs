//! Financial goal operations

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::{
    delete_row, parse_datetime, parse_stored_date, require_finite, require_text, ColumnUpdates,
    Database,
};
use crate::error::{Error, Result};
use crate::models::{FinancialGoal, GoalFrequency, GoalUpdate, NewGoal};

const SELECT_GOAL: &str = "SELECT id, name, target_amount, category, recurring, income_amount, frequency, target_date, created_at, updated_at FROM financial_goals";

fn require_target(value: f64) -> Result<()> {
    require_finite("targetAmount", value)?;
    if value <= 0.0 {
        return Err(Error::Validation(
            "targetAmount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

impl Database {
    /// Insert a goal and return it with its assigned id
    pub fn create_goal(&self, goal: &NewGoal) -> Result<FinancialGoal> {
        require_text("name", &goal.name)?;
        require_text("category", &goal.category)?;
        require_target(goal.target_amount)?;
        if let Some(income) = goal.income_amount {
            require_finite("incomeAmount", income)?;
        }

        let created = self.run_transaction(|conn| {
            conn.execute(
                r#"
                INSERT INTO financial_goals
                    (name, target_amount, category, recurring, income_amount, frequency, target_date, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
                "#,
                params![
                    goal.name.trim(),
                    goal.target_amount,
                    goal.category.trim(),
                    goal.recurring,
                    goal.income_amount,
                    goal.frequency.map(|f| f.as_str()),
                    goal.target_date.to_string(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            fetch_goal(conn, id)?
                .ok_or_else(|| Error::NotFound(format!("Goal {} after insert", id)))
        })?;

        debug!(id = created.id, "Created goal");
        Ok(created)
    }

    /// List all goals in creation order
    pub fn list_goals(&self) -> Result<Vec<FinancialGoal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_GOAL))?;

        let goals = stmt
            .query_map([], Self::row_to_goal)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(goals)
    }

    /// Get a single goal by ID
    pub fn get_goal(&self, id: i64) -> Result<Option<FinancialGoal>> {
        let conn = self.conn()?;
        fetch_goal(&conn, id)
    }

    /// Apply a partial edit; `false` when no goal has this id
    pub fn update_goal(&self, id: i64, update: &GoalUpdate) -> Result<bool> {
        if let Some(name) = &update.name {
            require_text("name", name)?;
        }
        if let Some(category) = &update.category {
            require_text("category", category)?;
        }
        if let Some(target) = update.target_amount {
            require_target(target)?;
        }
        if let Some(income) = update.income_amount {
            require_finite("incomeAmount", income)?;
        }

        let updated = self.run_transaction(|conn| {
            ColumnUpdates::new()
                .set("name", update.name.as_ref().map(|n| n.trim().to_string()))
                .set("target_amount", update.target_amount)
                .set(
                    "category",
                    update.category.as_ref().map(|c| c.trim().to_string()),
                )
                .set("recurring", update.recurring)
                .set("income_amount", update.income_amount)
                .set("frequency", update.frequency.map(|f| f.as_str()))
                .set("target_date", update.target_date.map(|d| d.to_string()))
                .apply(conn, "financial_goals", id)
        })?;

        debug!(id, updated, "Update goal");
        Ok(updated)
    }

    /// Delete a goal; `false` when no goal has this id
    pub fn delete_goal(&self, id: i64) -> Result<bool> {
        let removed = self.run_transaction(|conn| delete_row(conn, "financial_goals", id))?;
        debug!(id, removed, "Delete goal");
        Ok(removed)
    }

    /// Column order: id, name, target_amount, category, recurring, income_amount,
    ///               frequency, target_date, created_at, updated_at
    pub(crate) fn row_to_goal(row: &rusqlite::Row) -> rusqlite::Result<FinancialGoal> {
        let id: i64 = row.get(0)?;
        let frequency_str: Option<String> = row.get(6)?;
        let target_date_str: String = row.get(7)?;
        let frequency = frequency_str.and_then(|raw| match raw.parse::<GoalFrequency>() {
            Ok(frequency) => Some(frequency),
            Err(e) => {
                warn!(id, %raw, error = %e, "Unparseable stored frequency, treating as unset");
                None
            }
        });
        Ok(FinancialGoal {
            id,
            name: row.get(1)?,
            target_amount: row.get(2)?,
            category: row.get(3)?,
            recurring: row.get(4)?,
            income_amount: row.get(5)?,
            frequency,
            target_date: parse_stored_date("financial_goals", id, &target_date_str),
            created_at: parse_datetime(row.get(8)?),
            updated_at: parse_datetime(row.get(9)?),
        })
    }
}

fn fetch_goal(conn: &Connection, id: i64) -> Result<Option<FinancialGoal>> {
    let goal = conn
        .query_row(
            &format!("{} WHERE id = ?", SELECT_GOAL),
            params![id],
            Database::row_to_goal,
        )
        .optional()?;
    Ok(goal)
}
