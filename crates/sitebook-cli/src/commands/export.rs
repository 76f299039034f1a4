//! Export command implementation

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sitebook_core::export;
use sitebook_core::tax::DateWindow;

use super::open_db;
use crate::cli::ExportKindArg;

pub fn cmd_export(
    db_path: &Path,
    kind: ExportKindArg,
    output: &Path,
    no_encrypt: bool,
) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;
    let window = DateWindow::default();

    let (csv, count) = match kind {
        ExportKindArg::Purchases => {
            let records = db.list_purchases(&window, i64::MAX, 0)?;
            (export::purchases_csv(&records)?, records.len())
        }
        ExportKindArg::Sales => {
            let records = db.list_sales(&window, i64::MAX, 0)?;
            let project_names: HashMap<i64, String> = db
                .list_projects()?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect();
            (export::sales_csv(&records, &project_names)?, records.len())
        }
        ExportKindArg::Expenses => {
            let records = db.list_expenses(&window, None)?;
            (export::expenses_csv(&records)?, records.len())
        }
    };

    fs::write(output, csv)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("✅ Exported {} records to {}", count, output.display());
    Ok(())
}
