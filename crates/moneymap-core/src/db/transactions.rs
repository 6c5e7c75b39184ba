//! Transaction operations

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::{
    delete_row, parse_datetime, parse_stored_date, require_finite, require_text, ColumnUpdates,
    Database,
};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction, TransactionStatus, TransactionUpdate};

const SELECT_TRANSACTION: &str =
    "SELECT id, name, date, status, amount, created_at, updated_at FROM transactions";

impl Database {
    /// Insert a transaction and return it with its assigned id
    pub fn create_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        require_text("name", &tx.name)?;
        require_finite("amount", tx.amount)?;

        let created = self.run_transaction(|conn| {
            conn.execute(
                r#"
                INSERT INTO transactions (name, date, status, amount, created_at, updated_at)
                VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
                "#,
                params![
                    tx.name.trim(),
                    tx.date.to_string(),
                    tx.status.as_str(),
                    tx.amount
                ],
            )?;
            let id = conn.last_insert_rowid();
            fetch_transaction(conn, id)?
                .ok_or_else(|| Error::NotFound(format!("Transaction {} after insert", id)))
        })?;

        debug!(id = created.id, "Created transaction");
        Ok(created)
    }

    /// List all transactions in creation order
    pub fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_TRANSACTION))?;

        let transactions = stmt
            .query_map([], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Get a single transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        fetch_transaction(&conn, id)
    }

    /// Apply a partial edit; `false` when no transaction has this id
    pub fn update_transaction(&self, id: i64, update: &TransactionUpdate) -> Result<bool> {
        if let Some(name) = &update.name {
            require_text("name", name)?;
        }
        if let Some(amount) = update.amount {
            require_finite("amount", amount)?;
        }

        let updated = self.run_transaction(|conn| {
            ColumnUpdates::new()
                .set("name", update.name.as_ref().map(|n| n.trim().to_string()))
                .set("date", update.date.map(|d| d.to_string()))
                .set("status", update.status.map(|s| s.as_str()))
                .set("amount", update.amount)
                .apply(conn, "transactions", id)
        })?;

        debug!(id, updated, "Update transaction");
        Ok(updated)
    }

    /// Delete a transaction; `false` when no transaction has this id
    pub fn delete_transaction(&self, id: i64) -> Result<bool> {
        let removed = self.run_transaction(|conn| delete_row(conn, "transactions", id))?;
        debug!(id, removed, "Delete transaction");
        Ok(removed)
    }

    /// Helper to convert a row to Transaction
    /// Column order: id, name, date, status, amount, created_at, updated_at
    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let id: i64 = row.get(0)?;
        let date_str: String = row.get(2)?;
        let status_str: String = row.get(3)?;
        let status = status_str.parse().unwrap_or_else(|e: String| {
            warn!(id, raw = %status_str, error = %e, "Unparseable stored status, using expense");
            TransactionStatus::Expense
        });
        Ok(Transaction {
            id,
            name: row.get(1)?,
            date: parse_stored_date("transactions", id, &date_str),
            status,
            amount: row.get(4)?,
            created_at: parse_datetime(row.get(5)?),
            updated_at: parse_datetime(row.get(6)?),
        })
    }
}

fn fetch_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let transaction = conn
        .query_row(
            &format!("{} WHERE id = ?", SELECT_TRANSACTION),
            params![id],
            Database::row_to_transaction,
        )
        .optional()?;
    Ok(transaction)
}
