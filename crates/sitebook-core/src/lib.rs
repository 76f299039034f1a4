//! Sitebook Core Library
//!
//! Shared functionality for the Sitebook construction back-office ledger:
//! - Database access and migrations (encrypted SQLite)
//! - RRA CSV import parsers for purchases and sales
//! - Set-difference reconciliation of imported records
//! - Tax liability aggregation (VAT position + withholding)
//! - CSV export for downloadable reports
//! - Audit log writer

pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod reconcile;
pub mod tax;

pub use db::{AuditEntry, Database};
pub use error::{Error, Result};
pub use models::{CancelledRecord, ImportOutcome};
pub use reconcile::{plan_reconciliation, Receipted, ReconciliationPlan};
pub use tax::{compute_liability, DateWindow, TaxSummary};
