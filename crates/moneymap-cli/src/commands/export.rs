//! Export command implementation

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use moneymap_core::db::Database;
use moneymap_core::Exporter;

pub async fn cmd_export(db: &Database, output: Option<&Path>, strict: bool) -> Result<()> {
    let export = Exporter::new(db.clone())
        .export_snapshot()
        .await
        .context("Export failed")?;

    let failed = export.failed_domains();
    if strict {
        export.ensure_complete()?;
    } else if !failed.is_empty() {
        eprintln!("⚠️  Partial export, failed domains: {}", failed.join(", "));
    }

    let json = export.to_json_pretty()?;

    match output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✅ Exported to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
