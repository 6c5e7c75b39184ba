//! Aggregated export of goals, budget rows and transactions
//!
//! Used for reporting and as assistant context. The three domains are read
//! concurrently; a failing domain is reported in place as `{"error": ...}`
//! instead of failing the whole document.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{BudgetRow, FinancialGoal, Transaction};

/// One domain of the export: its records, or why they could not be read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainExport<T> {
    Records(Vec<T>),
    Failed { error: String },
}

impl<T> DomainExport<T> {
    pub fn records(&self) -> Option<&[T]> {
        match self {
            Self::Records(records) => Some(records),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Records(_) => None,
            Self::Failed { error } => Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// The merged `{goals, budget, transactions}` document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedExport {
    /// RFC 3339 time the export was assembled
    pub exported_at: String,
    pub goals: DomainExport<FinancialGoal>,
    /// Raw budget rows, anchor row included
    pub budget: DomainExport<BudgetRow>,
    pub transactions: DomainExport<Transaction>,
}

impl AggregatedExport {
    /// Names of the domains that could not be read
    pub fn failed_domains(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.goals.is_failed() {
            failed.push("goals");
        }
        if self.budget.is_failed() {
            failed.push("budget");
        }
        if self.transactions.is_failed() {
            failed.push("transactions");
        }
        failed
    }

    /// Turn any per-domain failure into a [`Error::PartialExport`]
    pub fn ensure_complete(&self) -> Result<()> {
        let failed = self.failed_domains();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::PartialExport(
                failed.into_iter().map(String::from).collect(),
            ))
        }
    }

    /// JSON with 4-space indentation
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(|e| Error::Export(e.to_string()))
    }
}

/// Builds [`AggregatedExport`] documents
#[derive(Clone)]
pub struct Exporter {
    db: Database,
}

impl Exporter {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Read all three domains concurrently and merge them
    ///
    /// Only fails when every domain fails, which points at the storage
    /// itself rather than one table.
    pub async fn export_snapshot(&self) -> Result<AggregatedExport> {
        let (goals, budget, transactions) = tokio::join!(
            fetch_domain(self.db.clone(), "goals", |db| db.list_goals()),
            fetch_domain(self.db.clone(), "budget", |db| db.list_budget_rows()),
            fetch_domain(self.db.clone(), "transactions", |db| {
                db.list_transactions()
            }),
        );

        let export = AggregatedExport {
            exported_at: Utc::now().to_rfc3339(),
            goals,
            budget,
            transactions,
        };

        let failed = export.failed_domains();
        if failed.len() == 3 {
            let reasons = [
                export.goals.error(),
                export.budget.error(),
                export.transactions.error(),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("; ");
            error!(%reasons, "Export failed for every domain");
            return Err(Error::Export(reasons));
        }

        if failed.is_empty() {
            info!("Aggregated export assembled");
        } else {
            warn!(failed = ?failed, "Aggregated export is partial");
        }
        Ok(export)
    }
}

/// Run one domain read on the blocking pool, capturing its failure
async fn fetch_domain<T, F>(db: Database, domain: &'static str, read: F) -> DomainExport<T>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<Vec<T>> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || read(&db))
        .await
        .map_err(|e| Error::Task(e.to_string()))
        .and_then(|r| r);

    match result {
        Ok(records) => {
            debug!(domain, count = records.len(), "Export domain read");
            DomainExport::Records(records)
        }
        Err(e) => {
            warn!(domain, error = %e, "Export domain failed");
            DomainExport::Failed {
                error: e.to_string(),
            }
        }
    }
}
