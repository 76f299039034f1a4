//! CLI command tests

use std::fs;

use tempfile::TempDir;

use crate::cli::{ExportKindArg, ImportKindArg};
use crate::commands;

const PURCHASES_CSV: &str = "\
Supplier TIN,Supplier name,Nature of Goods,Receipt number,Receipt issue date,Amount without VAT,VAT
101234567,Kigali Cement Ltd,Cement,RCT-001,05/01/2024,\"100,000.00\",18000.00
101234567,Kigali Cement Ltd,Cement,RCT-002,06/01/2024,50000.00,9000.00
";

#[test]
fn test_cmd_init_creates_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sitebook.db");

    commands::cmd_init(&db_path, true).unwrap();
    assert!(db_path.exists());
}

#[test]
fn test_cmd_import_purchases() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sitebook.db");
    let csv_path = dir.path().join("purchases.csv");
    fs::write(&csv_path, PURCHASES_CSV).unwrap();

    commands::cmd_import(&db_path, &csv_path, ImportKindArg::Purchases, true).unwrap();

    let db = commands::open_db(&db_path, true).unwrap();
    let purchases = db.list_all_purchases().unwrap();
    assert_eq!(purchases.len(), 2);
    // total = net + vat, never read from the file
    let rct1 = purchases
        .iter()
        .find(|p| p.receipt_number == "RCT-001")
        .unwrap();
    assert_eq!(rct1.total, 118000.0);
}

#[test]
fn test_cmd_import_missing_file() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sitebook.db");
    let missing = dir.path().join("nope.csv");

    let result = commands::cmd_import(&db_path, &missing, ImportKindArg::Purchases, true);
    assert!(result.is_err());
}

#[test]
fn test_cmd_report_runs_on_empty_db() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sitebook.db");
    commands::cmd_init(&db_path, true).unwrap();

    commands::cmd_report(&db_path, Some("2024-01-01"), Some("2024-12-31"), true).unwrap();
}

#[test]
fn test_cmd_report_rejects_bad_date() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sitebook.db");
    commands::cmd_init(&db_path, true).unwrap();

    let result = commands::cmd_report(&db_path, Some("01/01/2024"), None, true);
    assert!(result.is_err());
}

#[test]
fn test_cmd_export_purchases() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sitebook.db");
    let csv_path = dir.path().join("purchases.csv");
    let out_path = dir.path().join("export.csv");
    fs::write(&csv_path, PURCHASES_CSV).unwrap();

    commands::cmd_import(&db_path, &csv_path, ImportKindArg::Purchases, true).unwrap();
    commands::cmd_export(&db_path, ExportKindArg::Purchases, &out_path, true).unwrap();

    let text = fs::read_to_string(&out_path).unwrap();
    assert!(text.starts_with("Date,Supplier TIN"));
    assert!(text.contains("RCT-001"));
    assert!(text.contains("118000.00"));
}

#[test]
fn test_cmd_status_runs() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sitebook.db");
    commands::cmd_init(&db_path, true).unwrap();

    commands::cmd_status(&db_path, true).unwrap();
}
