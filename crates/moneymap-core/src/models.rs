//! Domain models for MoneyMap
//!
//! Wire form is camelCase to match the desktop UI payloads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Category of the budget anchor row carrying the snapshot income
pub const ANCHOR_CATEGORY: &str = "Income";

// ========== Transactions ==========

/// Whether a transaction brought money in or sent it out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Income,
    Expense,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction status: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A logged transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub status: TransactionStatus,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A transaction to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub name: String,
    pub date: NaiveDate,
    pub status: TransactionStatus,
    pub amount: f64,
}

/// Partial transaction edit; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionUpdate {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<TransactionStatus>,
    pub amount: Option<f64>,
}

// ========== Financial goals ==========

/// How often a recurring goal receives income
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl GoalFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }
}

impl std::str::FromStr for GoalFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            _ => Err(format!("Unknown goal frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for GoalFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A savings or spending goal
///
/// `income_amount` and `frequency` are expected only on recurring goals;
/// the store keeps whatever the caller sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialGoal {
    pub id: i64,
    pub name: String,
    pub target_amount: f64,
    pub category: String,
    pub recurring: bool,
    pub income_amount: Option<f64>,
    pub frequency: Option<GoalFrequency>,
    pub target_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A goal to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub name: String,
    pub target_amount: f64,
    pub category: String,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub income_amount: Option<f64>,
    #[serde(default)]
    pub frequency: Option<GoalFrequency>,
    pub target_date: NaiveDate,
}

/// Partial goal edit
///
/// `income_amount` and `frequency` can only be set here, not cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalUpdate {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub category: Option<String>,
    pub recurring: Option<bool>,
    pub income_amount: Option<f64>,
    pub frequency: Option<GoalFrequency>,
    pub target_date: Option<NaiveDate>,
}

// ========== Budget ==========

/// One physical budget row
///
/// A budget as the user sees it is the anchor row (`category == "Income"`)
/// plus every category row sharing its income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRow {
    pub id: i64,
    pub income: f64,
    pub category: String,
    pub expense: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetRow {
    pub fn is_anchor(&self) -> bool {
        self.category == ANCHOR_CATEGORY
    }
}

/// A budget row to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudgetRow {
    #[serde(default)]
    pub income: f64,
    pub category: String,
    #[serde(default, alias = "expenseAmount")]
    pub expense: f64,
}

/// Partial budget row edit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetRowUpdate {
    pub income: Option<f64>,
    pub category: Option<String>,
    #[serde(alias = "expenseAmount")]
    pub expense: Option<f64>,
}

/// One category line in a full budget save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub category: String,
    pub expense: f64,
}

impl ExpenseEntry {
    pub fn new(category: impl Into<String>, expense: f64) -> Self {
        Self {
            category: category.into(),
            expense,
        }
    }
}

/// A category row as seen through the grouped snapshot view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    pub id: i64,
    pub category: String,
    pub expense: f64,
}

/// The current budget, grouped around its anchor row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    /// Income from the anchor row; `None` when no budget has been saved
    pub income: Option<f64>,
    pub anchor_id: Option<i64>,
    pub categories: Vec<BudgetCategory>,
}

impl BudgetSnapshot {
    /// Group raw budget rows around their anchor row
    ///
    /// With several anchor rows (possible only in files written before the
    /// single-anchor index) the newest one wins.
    pub fn from_rows(rows: &[BudgetRow]) -> Self {
        let anchor = rows.iter().filter(|r| r.is_anchor()).max_by_key(|r| r.id);

        Self {
            income: anchor.map(|a| a.income),
            anchor_id: anchor.map(|a| a.id),
            categories: rows
                .iter()
                .filter(|r| !r.is_anchor())
                .map(|r| BudgetCategory {
                    id: r.id,
                    category: r.category.clone(),
                    expense: r.expense,
                })
                .collect(),
        }
    }

    pub fn total_expenses(&self) -> f64 {
        self.categories.iter().map(|c| c.expense).sum()
    }

    /// Income left after all category expenses
    pub fn remaining(&self) -> f64 {
        self.income.unwrap_or(0.0) - self.total_expenses()
    }

    pub fn is_empty(&self) -> bool {
        self.income.is_none() && self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_str() {
        assert_eq!(
            "income".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Income
        );
        assert_eq!(
            "EXPENSE".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Expense
        );
        assert!("refund".parse::<TransactionStatus>().is_err());
        assert_eq!(TransactionStatus::Income.to_string(), "Income");
    }

    #[test]
    fn test_new_transaction_wire_format() {
        let tx: NewTransaction = serde_json::from_value(serde_json::json!({
            "name": "Paycheck",
            "date": "2024-01-01",
            "status": "Income",
            "amount": 2500
        }))
        .unwrap();
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(tx.status, TransactionStatus::Income);
        assert_eq!(tx.amount, 2500.0);
    }

    #[test]
    fn test_new_transaction_missing_field_rejected() {
        let result: std::result::Result<NewTransaction, _> =
            serde_json::from_value(serde_json::json!({
                "name": "Paycheck",
                "status": "Income",
                "amount": 2500
            }));
        assert!(result.is_err());
    }

    #[test]
    fn test_goal_camel_case_fields() {
        let goal: NewGoal = serde_json::from_value(serde_json::json!({
            "name": "Emergency fund",
            "targetAmount": 5000,
            "category": "Savings",
            "recurring": true,
            "incomeAmount": 250,
            "frequency": "monthly",
            "targetDate": "2025-12-31"
        }))
        .unwrap();
        assert_eq!(goal.target_amount, 5000.0);
        assert_eq!(goal.income_amount, Some(250.0));
        assert_eq!(goal.frequency, Some(GoalFrequency::Monthly));
    }

    #[test]
    fn test_budget_row_accepts_expense_amount_alias() {
        let row: NewBudgetRow = serde_json::from_value(serde_json::json!({
            "income": 3000,
            "category": "Rent",
            "expenseAmount": 1200
        }))
        .unwrap();
        assert_eq!(row.expense, 1200.0);

        let row: NewBudgetRow =
            serde_json::from_value(serde_json::json!({ "category": "Food" })).unwrap();
        assert_eq!(row.income, 0.0);
        assert_eq!(row.expense, 0.0);
    }

    #[test]
    fn test_snapshot_totals() {
        let snapshot = BudgetSnapshot {
            income: Some(3000.0),
            anchor_id: Some(1),
            categories: vec![
                BudgetCategory {
                    id: 2,
                    category: "Rent".into(),
                    expense: 1200.0,
                },
                BudgetCategory {
                    id: 3,
                    category: "Food".into(),
                    expense: 300.0,
                },
            ],
        };
        assert_eq!(snapshot.total_expenses(), 1500.0);
        assert_eq!(snapshot.remaining(), 1500.0);
        assert!(!snapshot.is_empty());
        assert!(BudgetSnapshot::default().is_empty());
    }

    #[test]
    fn test_snapshot_from_rows_prefers_newest_anchor() {
        let now = Utc::now();
        let row = |id: i64, income: f64, category: &str, expense: f64| BudgetRow {
            id,
            income,
            category: category.to_string(),
            expense,
            created_at: now,
            updated_at: now,
        };
        let rows = vec![
            row(1, 1000.0, "Income", 0.0),
            row(2, 1000.0, "Rent", 500.0),
            row(3, 2000.0, "Income", 0.0),
        ];

        let snapshot = BudgetSnapshot::from_rows(&rows);
        assert_eq!(snapshot.income, Some(2000.0));
        assert_eq!(snapshot.anchor_id, Some(3));
        assert_eq!(snapshot.categories.len(), 1);
        assert_eq!(snapshot.categories[0].category, "Rent");

        assert!(BudgetSnapshot::from_rows(&[]).is_empty());
    }
}
