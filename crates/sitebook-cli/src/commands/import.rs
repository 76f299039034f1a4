//! Import command implementation

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use sitebook_core::import::{parse_purchases_csv, parse_sales_csv};
use sitebook_core::ImportOutcome;

use super::open_db;
use crate::cli::ImportKindArg;

/// Actor recorded in the audit log for CLI imports
const CLI_ACTOR: &str = "cli";

pub fn cmd_import(
    db_path: &Path,
    file: &Path,
    kind: ImportKindArg,
    no_encrypt: bool,
) -> Result<()> {
    println!("📥 Importing {}...", file.display());

    let db = open_db(db_path, no_encrypt)?;
    let reader = File::open(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let outcome = match kind {
        ImportKindArg::Purchases => {
            let rows = parse_purchases_csv(reader).context("Failed to parse purchases CSV")?;
            println!("   Parsed {} purchase rows", rows.len());
            db.import_purchases(CLI_ACTOR, rows)?
        }
        ImportKindArg::Sales => {
            let rows = parse_sales_csv(reader).context("Failed to parse sales CSV")?;
            println!("   Parsed {} sale rows", rows.len());
            db.import_sales(CLI_ACTOR, rows)?
        }
    };

    debug!(
        inserted = outcome.inserted,
        unchanged = outcome.unchanged,
        cancelled = outcome.deleted,
        "import finished"
    );
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &ImportOutcome) {
    println!();
    println!("📊 Import Results");
    println!("   ─────────────────────────────");
    println!("   Inserted: {}", outcome.inserted);
    println!("   Unchanged: {}", outcome.unchanged);
    println!("   Cancelled: {}", outcome.deleted);

    if !outcome.cancelled.is_empty() {
        println!();
        println!("⚠️  Receipts removed because the new export omits them:");
        for rec in &outcome.cancelled {
            println!(
                "   {}: {} ({}, {:.2})",
                rec.receipt_number, rec.counterparty, rec.date, rec.total
            );
        }
    }

    println!();
    println!("✅ Import complete");
}
