//! Operation boundary consumed by the desktop UI
//!
//! Every operation returns an [`ApiResponse`]: `{"success": true, ...payload}`
//! or `{"success": false, "error": ..., "kind": ...}`. Errors from the store,
//! the budget manager or the exporter never cross this boundary as `Err`.
//!
//! Blocking SQLite work runs on tokio's blocking pool.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::budget::BudgetManager;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::export::Exporter;
use crate::models::{
    BudgetRowUpdate, BudgetSnapshot, ExpenseEntry, GoalUpdate, NewBudgetRow, NewGoal,
    NewTransaction, TransactionUpdate,
};

/// Uniform result shape of every [`Ledger`] operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error category tag, see [`Error::kind`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ApiResponse {
    /// A success carrying no payload
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            kind: None,
            payload: Map::new(),
        }
    }

    /// Add a payload entry to a success response
    pub fn with(mut self, key: &str, value: impl Serialize) -> Result<Self> {
        self.payload
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn failure(err: &Error) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            kind: Some(err.kind().to_string()),
            payload: Map::new(),
        }
    }

    /// Payload entry by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "success": false, "error": e.to_string(), "kind": "validation" })
        })
    }
}

/// Body of a full budget save
#[derive(Debug, Deserialize)]
struct SnapshotPayload {
    #[serde(default)]
    income: Option<f64>,
    #[serde(default)]
    expenses: Vec<ExpenseEntry>,
}

/// Deserialize a caller payload, reporting shape errors as validation failures
fn parse_payload<T: DeserializeOwned>(what: &str, data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| Error::Validation(format!("Invalid {}: {}", what, e)))
}

/// The ledger's public operations
#[derive(Clone)]
pub struct Ledger {
    db: Database,
    budget: BudgetManager,
    exporter: Exporter,
}

impl Ledger {
    pub fn new(db: Database) -> Self {
        Self {
            budget: BudgetManager::new(db.clone()),
            exporter: Exporter::new(db.clone()),
            db,
        }
    }

    // ========== Transactions ==========

    pub async fn create_transaction(&self, data: Value) -> ApiResponse {
        let result = self
            .blocking(move |db, _| {
                let new: NewTransaction = parse_payload("transaction", data)?;
                let created = db.create_transaction(&new)?;
                ApiResponse::ok().with("id", created.id)?.with("transaction", created)
            })
            .await;
        respond("create_transaction", result)
    }

    pub async fn list_transactions(&self) -> ApiResponse {
        let result = self
            .blocking(|db, _| ApiResponse::ok().with("transactions", db.list_transactions()?))
            .await;
        respond("list_transactions", result)
    }

    pub async fn update_transaction(&self, id: i64, data: Value) -> ApiResponse {
        let result = self
            .blocking(move |db, _| {
                let update: TransactionUpdate = parse_payload("transaction update", data)?;
                if !db.update_transaction(id, &update)? {
                    return Err(Error::NotFound(format!("Transaction {}", id)));
                }
                ApiResponse::ok().with("transaction", db.get_transaction(id)?)
            })
            .await;
        respond("update_transaction", result)
    }

    pub async fn delete_transaction(&self, id: i64) -> ApiResponse {
        let result = self
            .blocking(move |db, _| {
                if !db.delete_transaction(id)? {
                    return Err(Error::NotFound(format!("Transaction {}", id)));
                }
                ApiResponse::ok().with("id", id)
            })
            .await;
        respond("delete_transaction", result)
    }

    // ========== Goals ==========

    pub async fn create_goal(&self, data: Value) -> ApiResponse {
        let result = self
            .blocking(move |db, _| {
                let new: NewGoal = parse_payload("goal", data)?;
                let created = db.create_goal(&new)?;
                ApiResponse::ok().with("id", created.id)?.with("goal", created)
            })
            .await;
        respond("create_goal", result)
    }

    pub async fn list_goals(&self) -> ApiResponse {
        let result = self
            .blocking(|db, _| ApiResponse::ok().with("goals", db.list_goals()?))
            .await;
        respond("list_goals", result)
    }

    pub async fn update_goal(&self, id: i64, data: Value) -> ApiResponse {
        let result = self
            .blocking(move |db, _| {
                let update: GoalUpdate = parse_payload("goal update", data)?;
                if !db.update_goal(id, &update)? {
                    return Err(Error::NotFound(format!("Goal {}", id)));
                }
                ApiResponse::ok().with("goal", db.get_goal(id)?)
            })
            .await;
        respond("update_goal", result)
    }

    pub async fn delete_goal(&self, id: i64) -> ApiResponse {
        let result = self
            .blocking(move |db, _| {
                if !db.delete_goal(id)? {
                    return Err(Error::NotFound(format!("Goal {}", id)));
                }
                ApiResponse::ok().with("id", id)
            })
            .await;
        respond("delete_goal", result)
    }

    // ========== Budget ==========

    pub async fn create_budget_category(&self, data: Value) -> ApiResponse {
        let result = self
            .blocking(move |_, budget| {
                let new: NewBudgetRow = parse_payload("budget category", data)?;
                let row = budget.upsert_category(None, new.income, &new.category, new.expense)?;
                ApiResponse::ok().with("id", row.id)?.with("budget", row)
            })
            .await;
        respond("create_budget_category", result)
    }

    /// Raw budget rows plus the grouped view, both from one read
    pub async fn list_budget(&self) -> ApiResponse {
        let result = self
            .blocking(|db, _| {
                let rows = db.list_budget_rows()?;
                let snapshot = BudgetSnapshot::from_rows(&rows);
                ApiResponse::ok()
                    .with("budgets", rows)?
                    .with("snapshot", snapshot)
            })
            .await;
        respond("list_budget", result)
    }

    pub async fn update_budget_category(&self, id: i64, data: Value) -> ApiResponse {
        let result = self
            .blocking(move |_, budget| {
                let update: BudgetRowUpdate = parse_payload("budget category update", data)?;
                ApiResponse::ok().with("budget", budget.update_category(id, &update)?)
            })
            .await;
        respond("update_budget_category", result)
    }

    pub async fn delete_budget_category(&self, id: i64) -> ApiResponse {
        let result = self
            .blocking(move |_, budget| {
                budget.remove_category(id)?;
                ApiResponse::ok().with("id", id)
            })
            .await;
        respond("delete_budget_category", result)
    }

    pub async fn clear_budget(&self) -> ApiResponse {
        let result = self
            .blocking(|_, budget| ApiResponse::ok().with("removed", budget.clear_all()?))
            .await;
        respond("clear_budget", result)
    }

    /// Replace the whole budget with `{income, expenses: [{category, expense}]}`
    pub async fn replace_budget_snapshot(&self, data: Value) -> ApiResponse {
        let result = self
            .blocking(move |_, budget| {
                let payload: SnapshotPayload = parse_payload("budget", data)?;
                let income = payload
                    .income
                    .ok_or_else(|| Error::Snapshot("income is required".to_string()))?;
                let id = budget.replace_snapshot(income, &payload.expenses)?;
                ApiResponse::ok().with("id", id)
            })
            .await;
        respond("replace_budget_snapshot", result)
    }

    pub async fn current_budget_snapshot(&self) -> ApiResponse {
        let result = self
            .blocking(|_, budget| ApiResponse::ok().with("snapshot", budget.current_snapshot()?))
            .await;
        respond("current_budget_snapshot", result)
    }

    // ========== Export ==========

    /// Merged export; per-domain failures stay inside `data`
    pub async fn export_aggregated_snapshot(&self) -> ApiResponse {
        let result = self
            .exporter
            .export_snapshot()
            .await
            .and_then(|export| ApiResponse::ok().with("data", export));
        respond("export_aggregated_snapshot", result)
    }

    // ========== Channel dispatch ==========

    /// Route a desktop IPC channel and its positional arguments
    ///
    /// Arguments follow the UI's calling conventions: `update-transaction`
    /// takes `(id, data)`, `update-budget` takes `({id, budgetData})` and
    /// `create-budget` takes `({budgetData})` or the bare row.
    pub async fn dispatch(&self, channel: &str, args: Vec<Value>) -> ApiResponse {
        debug!(channel, args = args.len(), "Dispatching");
        let mut args = args.into_iter();
        let first = args.next().unwrap_or(Value::Null);
        let second = args.next().unwrap_or(Value::Null);

        match channel {
            "create-transaction" => self.create_transaction(first).await,
            "get-transactions" => self.list_transactions().await,
            "update-transaction" => match parse_id(&first) {
                Ok(id) => self.update_transaction(id, second).await,
                Err(e) => respond(channel, Err(e)),
            },
            "delete-transaction" => match parse_id(&first) {
                Ok(id) => self.delete_transaction(id).await,
                Err(e) => respond(channel, Err(e)),
            },
            "create-goal" => self.create_goal(first).await,
            "get-goals" => self.list_goals().await,
            "update-goal" => match parse_id(&first) {
                Ok(id) => self.update_goal(id, second).await,
                Err(e) => respond(channel, Err(e)),
            },
            "delete-goal" => match parse_id(&first) {
                Ok(id) => self.delete_goal(id).await,
                Err(e) => respond(channel, Err(e)),
            },
            "create-budget" => self.create_budget_category(unwrap_budget_data(first)).await,
            "get-budgets" => self.list_budget().await,
            "update-budget" => {
                let id = first.get("id").cloned().unwrap_or(Value::Null);
                match parse_id(&id) {
                    Ok(id) => {
                        self.update_budget_category(id, unwrap_budget_data(first))
                            .await
                    }
                    Err(e) => respond(channel, Err(e)),
                }
            }
            "delete-budget" => match parse_id(&first) {
                Ok(id) => self.delete_budget_category(id).await,
                Err(e) => respond(channel, Err(e)),
            },
            "save-budget" => self.replace_budget_snapshot(first).await,
            "clear-budgets" => self.clear_budget().await,
            "export-json" => self.export_aggregated_snapshot().await,
            other => respond(
                "dispatch",
                Err(Error::Validation(format!("Unknown channel: {}", other))),
            ),
        }
    }

    /// Run store work on the blocking pool
    async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database, &BudgetManager) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        let budget = self.budget.clone();
        tokio::task::spawn_blocking(move || work(&db, &budget))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }
}

/// Convert an operation result into its response, logging failures
fn respond(operation: &str, result: Result<ApiResponse>) -> ApiResponse {
    match result {
        Ok(response) => response,
        Err(e) => {
            warn!(operation, kind = e.kind(), error = %e, "Operation failed");
            ApiResponse::failure(&e)
        }
    }
}

/// Ids arrive as JSON numbers, or as numeric strings from form fields
fn parse_id(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::Validation(format!("Invalid id: {}", value)))
}

/// Budget channels wrap the row as `{budgetData: {...}}`
fn unwrap_budget_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("budgetData") => {
            map.remove("budgetData").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ledger() -> Ledger {
        Ledger::new(Database::in_memory().unwrap())
    }

    fn id_of(response: &ApiResponse) -> i64 {
        response.get("id").and_then(Value::as_i64).unwrap()
    }

    #[tokio::test]
    async fn test_create_transaction_response() {
        let ledger = ledger();
        let response = ledger
            .create_transaction(json!({
                "name": "Paycheck",
                "date": "2024-01-01",
                "status": "Income",
                "amount": 2500
            }))
            .await;

        assert!(response.success);
        assert!(response.error.is_none());
        assert_eq!(response.get("transaction").unwrap()["name"], "Paycheck");

        let value = response.to_value();
        assert_eq!(value["success"], true);
        assert!(value.get("error").is_none());
        assert!(value["id"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_validation_failure() {
        let ledger = ledger();
        let response = ledger.create_transaction(json!({ "name": "Paycheck" })).await;

        assert!(!response.success);
        assert_eq!(response.kind.as_deref(), Some("validation"));

        let listed = ledger.list_transactions().await;
        assert_eq!(listed.get("transactions").unwrap(), &json!([]));
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let ledger = ledger();

        let response = ledger.delete_transaction(42).await;
        assert!(!response.success);
        assert_eq!(response.kind.as_deref(), Some("not_found"));

        let response = ledger.update_goal(42, json!({ "name": "Ghost" })).await;
        assert_eq!(response.kind.as_deref(), Some("not_found"));

        let value = response.to_value();
        assert_eq!(value["success"], false);
        assert!(value["error"].is_string());
    }

    #[tokio::test]
    async fn test_update_returns_stored_record() {
        let ledger = ledger();
        let created = ledger
            .create_goal(json!({
                "name": "Vacation",
                "targetAmount": 1500,
                "category": "Travel",
                "targetDate": "2025-06-01"
            }))
            .await;
        let id = id_of(&created);

        let updated = ledger.update_goal(id, json!({ "targetAmount": 2000 })).await;
        assert!(updated.success);
        assert_eq!(updated.get("goal").unwrap()["targetAmount"], 2000.0);
        assert_eq!(updated.get("goal").unwrap()["name"], "Vacation");
    }

    #[tokio::test]
    async fn test_replace_budget_snapshot() {
        let ledger = ledger();
        let response = ledger
            .replace_budget_snapshot(json!({
                "income": 3000,
                "expenses": [
                    { "category": "Rent", "expense": 1200 },
                    { "category": "Food", "expense": 0 }
                ],
                "categories": ["Rent", "Food"]
            }))
            .await;
        assert!(response.success);

        let snapshot = ledger.current_budget_snapshot().await;
        let snapshot = snapshot.get("snapshot").unwrap();
        assert_eq!(snapshot["income"], 3000.0);
        assert_eq!(snapshot["anchorId"].as_i64(), Some(id_of(&response)));
        assert_eq!(snapshot["categories"].as_array().unwrap().len(), 1);
        assert_eq!(snapshot["categories"][0]["category"], "Rent");
    }

    #[tokio::test]
    async fn test_replace_without_income_is_snapshot_failure() {
        let ledger = ledger();
        let response = ledger
            .replace_budget_snapshot(json!({ "expenses": [] }))
            .await;
        assert!(!response.success);
        assert_eq!(response.kind.as_deref(), Some("snapshot"));
    }

    #[tokio::test]
    async fn test_export_payload() {
        let ledger = ledger();
        let response = ledger.export_aggregated_snapshot().await;
        assert!(response.success);

        let data = response.get("data").unwrap();
        assert!(data["goals"].is_array());
        assert!(data["budget"].is_array());
        assert!(data["transactions"].is_array());
        assert!(data["exportedAt"].is_string());
    }

    #[tokio::test]
    async fn test_dispatch_channels() {
        let ledger = ledger();

        let created = ledger
            .dispatch(
                "create-transaction",
                vec![json!({
                    "name": "Groceries",
                    "date": "2024-01-03",
                    "status": "Expense",
                    "amount": 82.5
                })],
            )
            .await;
        let id = id_of(&created);

        let updated = ledger
            .dispatch("update-transaction", vec![json!(id), json!({ "amount": 90 })])
            .await;
        assert!(updated.success);
        assert_eq!(updated.get("transaction").unwrap()["amount"], 90.0);

        let deleted = ledger
            .dispatch("delete-transaction", vec![json!(id.to_string())])
            .await;
        assert!(deleted.success);

        let listed = ledger.dispatch("get-transactions", vec![]).await;
        assert_eq!(listed.get("transactions").unwrap(), &json!([]));
    }

    #[tokio::test]
    async fn test_dispatch_budget_channels() {
        let ledger = ledger();

        let created = ledger
            .dispatch(
                "create-budget",
                vec![json!({ "budgetData": { "income": 3000, "category": "Rent", "expenseAmount": 1200 } })],
            )
            .await;
        assert!(created.success);
        assert_eq!(created.get("budget").unwrap()["expense"], 1200.0);
        let id = id_of(&created);

        let updated = ledger
            .dispatch(
                "update-budget",
                vec![json!({ "id": id, "budgetData": { "expenseAmount": 1300 } })],
            )
            .await;
        assert!(updated.success);
        assert_eq!(updated.get("budget").unwrap()["expense"], 1300.0);

        let listed = ledger.dispatch("get-budgets", vec![]).await;
        assert_eq!(listed.get("budgets").unwrap().as_array().unwrap().len(), 1);

        let cleared = ledger.dispatch("clear-budgets", vec![]).await;
        assert_eq!(cleared.get("removed").and_then(Value::as_u64), Some(1));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_unknown_channel_and_bad_id() {
        let ledger = ledger();

        let response = ledger.dispatch("drop-tables", vec![]).await;
        assert!(!response.success);
        assert_eq!(response.kind.as_deref(), Some("validation"));

        let response = ledger.dispatch("delete-goal", vec![json!("abc")]).await;
        assert_eq!(response.kind.as_deref(), Some("validation"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_list_budget_rows_match_snapshot_during_saves() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let db = Database::in_memory().unwrap();
        let ledger = Ledger::new(db.clone());
        let manager = BudgetManager::new(db);
        manager
            .replace_snapshot(100.0, &[ExpenseEntry::new("Rent", 1.0)])
            .unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let writer = {
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut income = 100.0;
                while !stop.load(Ordering::Relaxed) {
                    income += 1.0;
                    manager
                        .replace_snapshot(income, &[ExpenseEntry::new("Rent", 1.0)])
                        .unwrap();
                }
            })
        };

        for _ in 0..300 {
            let listed = ledger.list_budget().await;
            assert!(listed.success);

            let rows = listed.get("budgets").unwrap().as_array().unwrap();
            let anchor = rows.iter().find(|r| r["category"] == "Income").unwrap();
            let snapshot = listed.get("snapshot").unwrap();
            assert_eq!(snapshot["anchorId"], anchor["id"]);
            assert_eq!(snapshot["income"], anchor["income"]);
        }

        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();
    }
}
