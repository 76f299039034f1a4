//! Tax liability aggregation queries

use rusqlite::params;

use super::Database;
use crate::error::Result;
use crate::tax::{compute_liability, DateWindow, TaxSummary};

impl Database {
    /// Sum VAT output, VAT input and withholding over a window and derive
    /// the company's position
    ///
    /// The three sums are independent queries: sales by invoice date,
    /// purchases by receipt date, casual payments by work date.
    pub fn tax_summary(&self, window: &DateWindow) -> Result<TaxSummary> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        let vat_output: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(vat_amount), 0)
            FROM sales
            WHERE (?1 IS NULL OR invoice_date >= ?1)
              AND (?2 IS NULL OR invoice_date <= ?2)
            "#,
            params![start, end],
            |row| row.get(0),
        )?;

        let vat_input: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(vat), 0)
            FROM purchases
            WHERE (?1 IS NULL OR date >= ?1)
              AND (?2 IS NULL OR date <= ?2)
            "#,
            params![start, end],
            |row| row.get(0),
        )?;

        let withholding: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(tax_amount), 0)
            FROM casual_payments
            WHERE (?1 IS NULL OR work_date >= ?1)
              AND (?2 IS NULL OR work_date <= ?2)
            "#,
            params![start, end],
            |row| row.get(0),
        )?;

        Ok(compute_liability(vat_output, vat_input, withholding))
    }
}
