//! Raw channel invocation, for scripting against the same operations the UI uses

use anyhow::{bail, Result};
use moneymap_core::db::Database;
use moneymap_core::Ledger;
use serde_json::Value;

/// Parse a CLI argument as JSON, falling back to a plain string
pub fn parse_arg(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

pub async fn cmd_call(db: &Database, channel: &str, args: &[String]) -> Result<()> {
    let args = args.iter().map(|a| parse_arg(a)).collect();
    let response = Ledger::new(db.clone()).dispatch(channel, args).await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.success {
        bail!(
            "{} failed: {}",
            channel,
            response.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
