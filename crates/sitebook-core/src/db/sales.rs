//! Imported sale records: reconciliation and project linking
//!
//! Sales follow the same import lifecycle as purchases, plus an explicit
//! link-to-project mutation used when attributing revenue to a site.

use rusqlite::params;
use tracing::error;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{AuditAction, CancelledRecord, ImportOutcome, NewSale, SaleRecord};
use crate::reconcile::plan_reconciliation;
use crate::tax::DateWindow;

fn row_to_sale(row: &rusqlite::Row<'_>) -> rusqlite::Result<SaleRecord> {
    let invoice_date: String = row.get(5)?;
    Ok(SaleRecord {
        id: row.get(0)?,
        buyer_tin: row.get(1)?,
        buyer_name: row.get(2)?,
        nature_of_goods: row.get(3)?,
        receipt_number: row.get(4)?,
        invoice_date: invoice_date.parse().unwrap_or_default(),
        amount_excl_vat: row.get(6)?,
        taxable_sales: row.get(7)?,
        vat_amount: row.get(8)?,
        project_id: row.get(9)?,
        created_at: row.get(10)?,
    })
}

const SALE_COLUMNS: &str = "id, buyer_tin, buyer_name, nature_of_goods, receipt_number, invoice_date, amount_excl_vat, taxable_sales, vat_amount, project_id, created_at";

/// Sums over the whole filter, not just the returned page
#[derive(Debug, Clone, serde::Serialize)]
pub struct SaleTotals {
    pub count: i64,
    pub amount_excl_vat: f64,
    pub taxable_sales: f64,
    pub vat_amount: f64,
}

impl Database {
    /// Insert a sale, skipping silently when the receipt number exists
    pub fn insert_sale(&self, new: &NewSale) -> Result<Option<i64>> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM sales WHERE receipt_number = ?",
                params![new.receipt_number],
                |row| row.get(0),
            )
            .ok();

        if existing.is_some() {
            return Ok(None); // Duplicate, skip
        }

        conn.execute(
            r#"
            INSERT INTO sales (buyer_tin, buyer_name, nature_of_goods, receipt_number, invoice_date, amount_excl_vat, taxable_sales, vat_amount)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                new.buyer_tin,
                new.buyer_name,
                new.nature_of_goods,
                new.receipt_number,
                new.invoice_date.to_string(),
                new.amount_excl_vat,
                new.taxable_sales,
                new.vat_amount,
            ],
        )?;

        Ok(Some(conn.last_insert_rowid()))
    }

    /// Every sale record, used for reconciliation planning
    pub fn list_all_sales(&self) -> Result<Vec<SaleRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sales ORDER BY invoice_date DESC, id DESC",
            SALE_COLUMNS
        ))?;

        let sales = stmt
            .query_map([], row_to_sale)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sales)
    }

    /// List sales within a window, newest first, paginated
    pub fn list_sales(
        &self,
        window: &DateWindow,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SaleRecord>> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
            FROM sales
            WHERE (?1 IS NULL OR invoice_date >= ?1)
              AND (?2 IS NULL OR invoice_date <= ?2)
            ORDER BY invoice_date DESC, id DESC
            LIMIT ?3 OFFSET ?4
            "#,
            SALE_COLUMNS
        ))?;

        let sales = stmt
            .query_map(params![start, end, limit, offset], row_to_sale)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sales)
    }

    /// Count and sums over the whole window (not just one page)
    pub fn sale_totals(&self, window: &DateWindow) -> Result<SaleTotals> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(SUM(amount_excl_vat), 0), COALESCE(SUM(taxable_sales), 0), COALESCE(SUM(vat_amount), 0)
            FROM sales
            WHERE (?1 IS NULL OR invoice_date >= ?1)
              AND (?2 IS NULL OR invoice_date <= ?2)
            "#,
            params![start, end],
            |row| {
                Ok(SaleTotals {
                    count: row.get(0)?,
                    amount_excl_vat: row.get(1)?,
                    taxable_sales: row.get(2)?,
                    vat_amount: row.get(3)?,
                })
            },
        )
        .map_err(Into::into)
    }

    pub fn delete_sale(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM sales WHERE id = ?", params![id])?;
        Ok(())
    }

    /// Delete every sale, returning the number removed
    pub fn clear_sales(&self) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sales", [])?;
        Ok(deleted)
    }

    /// Attribute a sale to a project (None unlinks it)
    pub fn link_sale_to_project(&self, sale_id: i64, project_id: Option<i64>) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE sales SET project_id = ? WHERE id = ?",
            params![project_id, sale_id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Sale {} not found", sale_id)));
        }
        Ok(())
    }

    /// Apply a reconciling sales import (same contract as `import_purchases`)
    pub fn import_sales(&self, actor: &str, incoming: Vec<NewSale>) -> Result<ImportOutcome> {
        let existing = self.list_all_sales()?;
        let plan = plan_reconciliation(existing, incoming);

        let mut deleted = 0;
        let mut cancelled = Vec::new();
        for rec in plan.to_delete {
            match self.delete_sale(rec.id) {
                Ok(()) => {
                    deleted += 1;
                    let detail = format!(
                        "Cancelled sale receipt {}: buyer {} (TIN {}), goods {}, invoice date {}, excl VAT {:.2}, taxable {:.2}, VAT {:.2}",
                        rec.receipt_number,
                        rec.buyer_name,
                        rec.buyer_tin,
                        rec.nature_of_goods.as_deref().unwrap_or("-"),
                        rec.invoice_date,
                        rec.amount_excl_vat,
                        rec.taxable_sales,
                        rec.vat_amount,
                    );
                    self.record_audit(
                        actor,
                        AuditAction::Warning,
                        Some("sales"),
                        Some(rec.id),
                        Some(&detail),
                    );
                    cancelled.push(CancelledRecord {
                        receipt_number: rec.receipt_number,
                        counterparty: rec.buyer_name,
                        date: rec.invoice_date,
                        total: rec.amount_excl_vat + rec.vat_amount,
                    });
                }
                Err(e) => {
                    error!("Failed to delete sale {}: {}", rec.receipt_number, e);
                }
            }
        }

        let mut inserted = 0;
        for row in &plan.to_insert {
            match self.insert_sale(row) {
                Ok(Some(_)) => inserted += 1,
                Ok(None) => {}
                Err(e) => {
                    error!("Failed to insert sale {}: {}", row.receipt_number, e);
                }
            }
        }

        let summary = format!(
            "Imported sales: {} inserted, {} cancelled, {} unchanged",
            inserted, deleted, plan.unchanged
        );
        self.record_audit(actor, AuditAction::Import, Some("sales"), None, Some(&summary));

        Ok(ImportOutcome {
            inserted,
            deleted,
            unchanged: plan.unchanged,
            cancelled,
        })
    }
}
