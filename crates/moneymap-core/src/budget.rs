//! Budget snapshot management
//!
//! A budget is stored as rows: one anchor row (`category == "Income"`,
//! `expense == 0`) carrying the income, and one row per spending category
//! repeating that income. `BudgetManager` keeps that grouping consistent:
//! a full save replaces every row in one transaction, so no reader ever sees
//! an anchor without its categories or stale categories without their anchor.

use tracing::{debug, info};

use crate::db::{clear_budget_rows, insert_budget_row, Database};
use crate::error::{Error, Result};
use crate::models::{
    BudgetRow, BudgetRowUpdate, BudgetSnapshot, ExpenseEntry, NewBudgetRow, ANCHOR_CATEGORY,
};

/// Snapshot-level operations over the budget rows
#[derive(Clone)]
pub struct BudgetManager {
    db: Database,
}

impl BudgetManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Replace the whole budget with `income` and `expenses`
    ///
    /// Entries whose expense is zero, negative or NaN are dropped. Any
    /// category not listed is gone afterwards. Returns the anchor row id.
    /// On failure the previous budget is left exactly as it was.
    pub fn replace_snapshot(&self, income: f64, expenses: &[ExpenseEntry]) -> Result<i64> {
        if !income.is_finite() || income <= 0.0 {
            return Err(Error::Snapshot(format!(
                "income must be a positive number, got {}",
                income
            )));
        }

        let kept: Vec<&ExpenseEntry> = expenses.iter().filter(|e| e.expense > 0.0).collect();
        for entry in &kept {
            if !entry.expense.is_finite() {
                return Err(Error::Snapshot(format!(
                    "expense for '{}' must be a finite number",
                    entry.category
                )));
            }
            let category = entry.category.trim();
            if category.is_empty() || category == ANCHOR_CATEGORY {
                return Err(Error::Snapshot(format!(
                    "invalid expense category '{}'",
                    entry.category
                )));
            }
        }

        let anchor_id = self
            .db
            .run_transaction(|conn| {
                let cleared = clear_budget_rows(conn)?;
                let anchor_id = insert_budget_row(conn, income, ANCHOR_CATEGORY, 0.0)?;
                for entry in &kept {
                    insert_budget_row(conn, income, entry.category.trim(), entry.expense)?;
                }
                debug!(cleared, "Replaced budget rows");
                Ok(anchor_id)
            })
            .map_err(|e| match e {
                Error::Snapshot(_) => e,
                other => Error::Snapshot(other.to_string()),
            })?;

        info!(
            anchor_id,
            income,
            categories = kept.len(),
            dropped = expenses.len() - kept.len(),
            "Budget snapshot saved"
        );
        Ok(anchor_id)
    }

    /// Create (`id == None`) or overwrite a single category row
    ///
    /// Other rows are untouched, including the anchor.
    pub fn upsert_category(
        &self,
        id: Option<i64>,
        income: f64,
        category: &str,
        expense: f64,
    ) -> Result<BudgetRow> {
        match id {
            None => self.db.create_budget_row(&NewBudgetRow {
                income,
                category: category.to_string(),
                expense,
            }),
            Some(id) => self.update_category(
                id,
                &BudgetRowUpdate {
                    income: Some(income),
                    category: Some(category.to_string()),
                    expense: Some(expense),
                },
            ),
        }
    }

    /// Apply a partial edit to one category row
    ///
    /// The anchor row is refused with a validation error.
    pub fn update_category(&self, id: i64, update: &BudgetRowUpdate) -> Result<BudgetRow> {
        if !self.db.update_budget_row(id, update)? {
            return Err(Error::NotFound(format!("Budget category {}", id)));
        }

        self.db
            .get_budget_row(id)?
            .ok_or_else(|| Error::NotFound(format!("Budget category {}", id)))
    }

    /// Delete one category row; the anchor row is refused
    pub fn remove_category(&self, id: i64) -> Result<()> {
        if !self.db.delete_budget_row(id)? {
            return Err(Error::NotFound(format!("Budget category {}", id)));
        }
        Ok(())
    }

    /// Delete every budget row, anchor included
    pub fn clear_all(&self) -> Result<usize> {
        let removed = self.db.clear_budget_rows()?;
        info!(removed, "Budget cleared");
        Ok(removed)
    }

    /// The current budget grouped around its anchor row
    ///
    /// Built from a single read, so it never mixes two saves.
    pub fn current_snapshot(&self) -> Result<BudgetSnapshot> {
        let rows = self.db.list_budget_rows()?;
        Ok(BudgetSnapshot::from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, BudgetManager) {
        let db = Database::in_memory().unwrap();
        let manager = BudgetManager::new(db.clone());
        (db, manager)
    }

    fn categories(snapshot: &BudgetSnapshot) -> Vec<(String, f64)> {
        snapshot
            .categories
            .iter()
            .map(|c| (c.category.clone(), c.expense))
            .collect()
    }

    #[test]
    fn test_empty_snapshot() {
        let (_db, manager) = setup();
        let snapshot = manager.current_snapshot().unwrap();
        assert!(snapshot.income.is_none());
        assert!(snapshot.anchor_id.is_none());
        assert!(snapshot.categories.is_empty());
    }

    #[test]
    fn test_replace_drops_zero_expenses() {
        let (_db, manager) = setup();

        let anchor_id = manager
            .replace_snapshot(
                3000.0,
                &[ExpenseEntry::new("Rent", 1200.0), ExpenseEntry::new("Food", 0.0)],
            )
            .unwrap();

        let snapshot = manager.current_snapshot().unwrap();
        assert_eq!(snapshot.income, Some(3000.0));
        assert_eq!(snapshot.anchor_id, Some(anchor_id));
        assert_eq!(categories(&snapshot), vec![("Rent".to_string(), 1200.0)]);
    }

    #[test]
    fn test_replace_drops_negative_and_nan_expenses() {
        let (_db, manager) = setup();

        manager
            .replace_snapshot(
                1000.0,
                &[
                    ExpenseEntry::new("Refund", -50.0),
                    ExpenseEntry::new("Bogus", f64::NAN),
                    ExpenseEntry::new("Gas", 80.0),
                ],
            )
            .unwrap();

        let snapshot = manager.current_snapshot().unwrap();
        assert_eq!(categories(&snapshot), vec![("Gas".to_string(), 80.0)]);
    }

    #[test]
    fn test_replace_is_full_replace() {
        let (db, manager) = setup();

        manager
            .replace_snapshot(
                3000.0,
                &[ExpenseEntry::new("Rent", 1200.0), ExpenseEntry::new("Gym", 40.0)],
            )
            .unwrap();
        manager
            .replace_snapshot(3500.0, &[ExpenseEntry::new("Rent", 1300.0)])
            .unwrap();

        let snapshot = manager.current_snapshot().unwrap();
        assert_eq!(snapshot.income, Some(3500.0));
        assert_eq!(categories(&snapshot), vec![("Rent".to_string(), 1300.0)]);

        // Every remaining row carries the new income
        let rows = db.list_budget_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.income == 3500.0));
    }

    #[test]
    fn test_replace_is_idempotent() {
        let (_db, manager) = setup();
        let expenses = [ExpenseEntry::new("Rent", 1200.0), ExpenseEntry::new("Food", 300.0)];

        manager.replace_snapshot(3000.0, &expenses).unwrap();
        let first = manager.current_snapshot().unwrap();
        manager.replace_snapshot(3000.0, &expenses).unwrap();
        let second = manager.current_snapshot().unwrap();

        assert_eq!(first.income, second.income);
        assert_eq!(categories(&first), categories(&second));
    }

    #[test]
    fn test_replace_rejects_bad_income_and_keeps_previous() {
        let (_db, manager) = setup();
        manager
            .replace_snapshot(3000.0, &[ExpenseEntry::new("Rent", 1200.0)])
            .unwrap();
        let before = manager.current_snapshot().unwrap();

        for income in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let result = manager.replace_snapshot(income, &[ExpenseEntry::new("Food", 10.0)]);
            assert!(matches!(result, Err(Error::Snapshot(_))), "income {}", income);
        }

        assert_eq!(manager.current_snapshot().unwrap(), before);
    }

    #[test]
    fn test_replace_rejects_reserved_or_blank_category() {
        let (_db, manager) = setup();

        let result = manager.replace_snapshot(100.0, &[ExpenseEntry::new("Income", 10.0)]);
        assert!(matches!(result, Err(Error::Snapshot(_))));

        let result = manager.replace_snapshot(100.0, &[ExpenseEntry::new("  ", 10.0)]);
        assert!(matches!(result, Err(Error::Snapshot(_))));

        // A blank category with zero expense is filtered before validation
        manager
            .replace_snapshot(100.0, &[ExpenseEntry::new("", 0.0)])
            .unwrap();
    }

    #[test]
    fn test_replace_rolls_back_on_write_failure() {
        let (db, manager) = setup();
        manager
            .replace_snapshot(
                3000.0,
                &[ExpenseEntry::new("Rent", 1200.0), ExpenseEntry::new("Food", 300.0)],
            )
            .unwrap();
        let before = manager.current_snapshot().unwrap();

        // Make the third inserted expense row fail
        db.conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER fail_boom BEFORE INSERT ON budgets WHEN NEW.category = 'Boom'
                 BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
            )
            .unwrap();

        let result = manager.replace_snapshot(
            4000.0,
            &[
                ExpenseEntry::new("Rent", 1500.0),
                ExpenseEntry::new("Travel", 200.0),
                ExpenseEntry::new("Boom", 1.0),
            ],
        );
        assert!(matches!(result, Err(Error::Snapshot(_))));

        assert_eq!(manager.current_snapshot().unwrap(), before);
        assert_eq!(db.list_budget_rows().unwrap().len(), 3);
    }

    #[test]
    fn test_upsert_creates_and_updates_single_row() {
        let (_db, manager) = setup();
        manager
            .replace_snapshot(3000.0, &[ExpenseEntry::new("Rent", 1200.0)])
            .unwrap();

        let created = manager.upsert_category(None, 3000.0, "Food", 250.0).unwrap();
        assert_eq!(created.category, "Food");

        let updated = manager
            .upsert_category(Some(created.id), 3000.0, "Groceries", 275.0)
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.category, "Groceries");
        assert_eq!(updated.expense, 275.0);

        let snapshot = manager.current_snapshot().unwrap();
        assert_eq!(
            categories(&snapshot),
            vec![
                ("Rent".to_string(), 1200.0),
                ("Groceries".to_string(), 275.0)
            ]
        );
        assert_eq!(snapshot.income, Some(3000.0));
    }

    #[test]
    fn test_upsert_unknown_id_is_not_found() {
        let (_db, manager) = setup();
        let result = manager.upsert_category(Some(999), 100.0, "Food", 10.0);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_anchor_row_is_protected() {
        let (_db, manager) = setup();
        let anchor_id = manager.replace_snapshot(3000.0, &[]).unwrap();

        assert!(matches!(
            manager.remove_category(anchor_id),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            manager.upsert_category(Some(anchor_id), 3000.0, "Rent", 10.0),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            manager.upsert_category(None, 3000.0, "Income", 10.0),
            Err(Error::Validation(_))
        ));
        assert_eq!(manager.current_snapshot().unwrap().income, Some(3000.0));
    }

    #[test]
    fn test_remove_category() {
        let (_db, manager) = setup();
        manager
            .replace_snapshot(
                3000.0,
                &[ExpenseEntry::new("Rent", 1200.0), ExpenseEntry::new("Food", 300.0)],
            )
            .unwrap();
        let snapshot = manager.current_snapshot().unwrap();
        let rent_id = snapshot.categories[0].id;

        manager.remove_category(rent_id).unwrap();
        assert!(matches!(
            manager.remove_category(rent_id),
            Err(Error::NotFound(_))
        ));

        let snapshot = manager.current_snapshot().unwrap();
        assert_eq!(categories(&snapshot), vec![("Food".to_string(), 300.0)]);
    }

    #[test]
    fn test_clear_all() {
        let (db, manager) = setup();
        manager
            .replace_snapshot(3000.0, &[ExpenseEntry::new("Rent", 1200.0)])
            .unwrap();

        assert_eq!(manager.clear_all().unwrap(), 2);
        assert!(db.list_budget_rows().unwrap().is_empty());
        assert!(manager.current_snapshot().unwrap().is_empty());
        assert_eq!(manager.clear_all().unwrap(), 0);
    }
}
