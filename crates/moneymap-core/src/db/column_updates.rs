//! Builder for partial-row UPDATE statements
//!
//! Collects `column = ?` assignments with boxed parameters, the same way
//! dynamic filters build their WHERE clauses.

use rusqlite::{params, params_from_iter, Connection, ToSql};

use crate::error::Result;

#[derive(Default)]
pub(crate) struct ColumnUpdates {
    columns: Vec<&'static str>,
    values: Vec<Box<dyn ToSql>>,
}

impl ColumnUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `column` when a value is present
    pub fn set<V: ToSql + 'static>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.columns.push(column);
            self.values.push(Box::new(value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Apply the assignments to row `id` of `table`
    ///
    /// Returns whether the row exists. With nothing to assign this is a pure
    /// existence check.
    pub fn apply(self, conn: &Connection, table: &str, id: i64) -> Result<bool> {
        if self.is_empty() {
            let exists: bool = conn.query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table),
                params![id],
                |row| row.get(0),
            )?;
            return Ok(exists);
        }

        let assignments = self
            .columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {}, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            table, assignments
        );

        let mut values = self.values;
        values.push(Box::new(id));
        let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(changed > 0)
    }
}

/// Delete row `id` of `table`, returning whether it existed
pub(crate) fn delete_row(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    let removed = conn.execute(&format!("DELETE FROM {} WHERE id = ?", table), params![id])?;
    Ok(removed > 0)
}
