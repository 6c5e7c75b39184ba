//! Budget row operations
//!
//! Plain row CRUD over `budgets`. Grouping rows into a snapshot around the
//! anchor row is handled by [`crate::budget::BudgetManager`].

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{delete_row, parse_datetime, require_finite, require_text, ColumnUpdates, Database};
use crate::error::{Error, Result};
use crate::models::{BudgetRow, BudgetRowUpdate, NewBudgetRow, ANCHOR_CATEGORY};

const SELECT_BUDGET_ROW: &str =
    "SELECT id, income, category, expense, created_at, updated_at FROM budgets";

/// Category rows may not claim the anchor category
fn require_category(category: &str) -> Result<()> {
    require_text("category", category)?;
    if category.trim() == ANCHOR_CATEGORY {
        return Err(Error::Validation(format!(
            "category '{}' is reserved for the budget income",
            ANCHOR_CATEGORY
        )));
    }
    Ok(())
}

impl Database {
    /// Insert a single category row
    pub fn create_budget_row(&self, row: &NewBudgetRow) -> Result<BudgetRow> {
        require_category(&row.category)?;
        require_finite("income", row.income)?;
        require_finite("expense", row.expense)?;

        let created = self.run_transaction(|conn| {
            let id = insert_budget_row(conn, row.income, row.category.trim(), row.expense)?;
            fetch_budget_row(conn, id)?
                .ok_or_else(|| Error::NotFound(format!("Budget row {} after insert", id)))
        })?;

        debug!(id = created.id, category = %created.category, "Created budget row");
        Ok(created)
    }

    /// List every budget row, anchor included, in creation order
    pub fn list_budget_rows(&self) -> Result<Vec<BudgetRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_BUDGET_ROW))?;

        let rows = stmt
            .query_map([], Self::row_to_budget_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Get a single budget row by ID
    pub fn get_budget_row(&self, id: i64) -> Result<Option<BudgetRow>> {
        let conn = self.conn()?;
        fetch_budget_row(&conn, id)
    }

    /// Apply a partial edit; `false` when no row has this id
    ///
    /// The anchor row is refused: its income is only set by a full save.
    pub fn update_budget_row(&self, id: i64, update: &BudgetRowUpdate) -> Result<bool> {
        if let Some(category) = &update.category {
            require_category(category)?;
        }
        if let Some(income) = update.income {
            require_finite("income", income)?;
        }
        if let Some(expense) = update.expense {
            require_finite("expense", expense)?;
        }

        let updated = self.run_transaction(|conn| {
            if !is_category_row(conn, id)? {
                return Ok(false);
            }
            ColumnUpdates::new()
                .set("income", update.income)
                .set(
                    "category",
                    update.category.as_ref().map(|c| c.trim().to_string()),
                )
                .set("expense", update.expense)
                .apply(conn, "budgets", id)
        })?;

        debug!(id, updated, "Update budget row");
        Ok(updated)
    }

    /// Delete a category row; `false` when no row has this id
    ///
    /// The anchor row is refused; [`Database::clear_budget_rows`] removes it.
    pub fn delete_budget_row(&self, id: i64) -> Result<bool> {
        let removed = self.run_transaction(|conn| {
            if !is_category_row(conn, id)? {
                return Ok(false);
            }
            delete_row(conn, "budgets", id)
        })?;
        debug!(id, removed, "Delete budget row");
        Ok(removed)
    }

    /// Delete every budget row, returning how many were removed
    pub fn clear_budget_rows(&self) -> Result<usize> {
        let removed = self.run_transaction(|conn| clear_budget_rows(conn))?;
        debug!(removed, "Cleared budget rows");
        Ok(removed)
    }

    /// Column order: id, income, category, expense, created_at, updated_at
    pub(crate) fn row_to_budget_row(row: &rusqlite::Row) -> rusqlite::Result<BudgetRow> {
        Ok(BudgetRow {
            id: row.get(0)?,
            income: row.get(1)?,
            category: row.get(2)?,
            expense: row.get(3)?,
            created_at: parse_datetime(row.get(4)?),
            updated_at: parse_datetime(row.get(5)?),
        })
    }
}

/// Insert a budget row inside an open transaction, returning its id
///
/// No field validation: callers check their inputs first.
pub(crate) fn insert_budget_row(
    conn: &Connection,
    income: f64,
    category: &str,
    expense: f64,
) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO budgets (income, category, expense, created_at, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
        params![income, category, expense],
    )?;
    Ok(conn.last_insert_rowid())
}

/// `false` when the row is missing, a validation error when it is the anchor
fn is_category_row(conn: &Connection, id: i64) -> Result<bool> {
    let category: Option<String> = conn
        .query_row(
            "SELECT category FROM budgets WHERE id = ?",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    match category {
        None => Ok(false),
        Some(c) if c == ANCHOR_CATEGORY => Err(Error::Validation(format!(
            "budget row {} is the income anchor",
            id
        ))),
        Some(_) => Ok(true),
    }
}

pub(crate) fn clear_budget_rows(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM budgets", [])?)
}

pub(crate) fn fetch_budget_row(conn: &Connection, id: i64) -> Result<Option<BudgetRow>> {
    let row = conn
        .query_row(
            &format!("{} WHERE id = ?", SELECT_BUDGET_ROW),
            params![id],
            Database::row_to_budget_row,
        )
        .optional()?;
    Ok(row)
}
