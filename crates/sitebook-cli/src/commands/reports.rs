//! Tax report command implementation

use std::path::Path;

use anyhow::Result;
use sitebook_core::tax::DateWindow;

use super::open_db;

pub fn cmd_report(
    db_path: &Path,
    from: Option<&str>,
    to: Option<&str>,
    no_encrypt: bool,
) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;
    let window = DateWindow::parse(from, to)?;

    let summary = db.tax_summary(&window)?;

    println!();
    println!("📊 Tax Summary");
    match (from, to) {
        (Some(f), Some(t)) => println!("   Window: {} to {} (inclusive)", f, t),
        (Some(f), None) => println!("   Window: from {}", f),
        (None, Some(t)) => println!("   Window: up to {} (inclusive)", t),
        (None, None) => println!("   Window: all records"),
    }
    println!("   ─────────────────────────────");
    println!("   VAT on sales (output):     {:>14.2}", summary.vat_output);
    println!("   VAT on purchases (input):  {:>14.2}", summary.vat_input);
    println!("   VAT position:              {:>14.2}", summary.vat_position);
    println!("   Withholding (casual 15%):  {:>14.2}", summary.withholding);
    println!("   ─────────────────────────────");
    println!("   Total liability:           {:>14.2}", summary.total_liability);

    if summary.vat_position < 0.0 {
        println!();
        println!("   💡 Input VAT exceeds output VAT; the VAT position is a credit.");
    }
    println!();

    Ok(())
}
