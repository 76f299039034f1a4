//! Imported purchase records and their reconciliation
//!
//! Purchases are only ever created by import. A later import that omits a
//! receipt number deletes the record (the upload is the authoritative
//! statement), writing one WARNING audit entry per deletion.

use rusqlite::params;
use tracing::error;

use super::Database;
use crate::error::Result;
use crate::models::{AuditAction, CancelledRecord, ImportOutcome, NewPurchase, PurchaseRecord};
use crate::reconcile::plan_reconciliation;
use crate::tax::DateWindow;

fn row_to_purchase(row: &rusqlite::Row<'_>) -> rusqlite::Result<PurchaseRecord> {
    let date: String = row.get(5)?;
    Ok(PurchaseRecord {
        id: row.get(0)?,
        supplier_tin: row.get(1)?,
        supplier_name: row.get(2)?,
        nature_of_goods: row.get(3)?,
        receipt_number: row.get(4)?,
        date: date.parse().unwrap_or_default(),
        net_amount: row.get(6)?,
        vat: row.get(7)?,
        total: row.get(8)?,
        created_at: row.get(9)?,
    })
}

const PURCHASE_COLUMNS: &str = "id, supplier_tin, supplier_name, nature_of_goods, receipt_number, date, net_amount, vat, total, created_at";

/// Sums over the whole filter, not just the returned page
#[derive(Debug, Clone, serde::Serialize)]
pub struct PurchaseTotals {
    pub count: i64,
    pub net_amount: f64,
    pub vat: f64,
    pub total: f64,
}

impl Database {
    /// Insert a purchase, skipping silently when the receipt number exists
    ///
    /// Returns the new row id, or None for a duplicate.
    pub fn insert_purchase(&self, new: &NewPurchase) -> Result<Option<i64>> {
        let conn = self.conn()?;

        // Check for duplicate receipt
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM purchases WHERE receipt_number = ?",
                params![new.receipt_number],
                |row| row.get(0),
            )
            .ok();

        if existing.is_some() {
            return Ok(None); // Duplicate, skip
        }

        conn.execute(
            r#"
            INSERT INTO purchases (supplier_tin, supplier_name, nature_of_goods, receipt_number, date, net_amount, vat, total)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                new.supplier_tin,
                new.supplier_name,
                new.nature_of_goods,
                new.receipt_number,
                new.date.to_string(),
                new.net_amount,
                new.vat,
                new.total,
            ],
        )?;

        Ok(Some(conn.last_insert_rowid()))
    }

    /// Every purchase record, used for reconciliation planning
    pub fn list_all_purchases(&self) -> Result<Vec<PurchaseRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM purchases ORDER BY date DESC, id DESC",
            PURCHASE_COLUMNS
        ))?;

        let purchases = stmt
            .query_map([], row_to_purchase)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(purchases)
    }

    /// List purchases within a window, newest first, paginated
    pub fn list_purchases(
        &self,
        window: &DateWindow,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PurchaseRecord>> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
            FROM purchases
            WHERE (?1 IS NULL OR date >= ?1)
              AND (?2 IS NULL OR date <= ?2)
            ORDER BY date DESC, id DESC
            LIMIT ?3 OFFSET ?4
            "#,
            PURCHASE_COLUMNS
        ))?;

        let purchases = stmt
            .query_map(params![start, end, limit, offset], row_to_purchase)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(purchases)
    }

    /// Count and sums over the whole window (not just one page)
    pub fn purchase_totals(&self, window: &DateWindow) -> Result<PurchaseTotals> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(SUM(net_amount), 0), COALESCE(SUM(vat), 0), COALESCE(SUM(total), 0)
            FROM purchases
            WHERE (?1 IS NULL OR date >= ?1)
              AND (?2 IS NULL OR date <= ?2)
            "#,
            params![start, end],
            |row| {
                Ok(PurchaseTotals {
                    count: row.get(0)?,
                    net_amount: row.get(1)?,
                    vat: row.get(2)?,
                    total: row.get(3)?,
                })
            },
        )
        .map_err(Into::into)
    }

    pub fn delete_purchase(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM purchases WHERE id = ?", params![id])?;
        Ok(())
    }

    /// Delete every purchase record, returning the number removed
    pub fn clear_purchases(&self) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM purchases", [])?;
        Ok(deleted)
    }

    /// Apply a reconciling purchases import
    ///
    /// Deletes records omitted from the batch (WARNING audit entry per
    /// deletion carrying the full descriptive fields), inserts new receipts,
    /// and writes one IMPORT summary entry. Individual persistence failures
    /// are logged and skipped; siblings proceed.
    pub fn import_purchases(&self, actor: &str, incoming: Vec<NewPurchase>) -> Result<ImportOutcome> {
        let existing = self.list_all_purchases()?;
        let plan = plan_reconciliation(existing, incoming);

        let mut deleted = 0;
        let mut cancelled = Vec::new();
        for rec in plan.to_delete {
            match self.delete_purchase(rec.id) {
                Ok(()) => {
                    deleted += 1;
                    let detail = format!(
                        "Cancelled purchase receipt {}: supplier {} (TIN {}), goods {}, date {}, net {:.2}, VAT {:.2}, total {:.2}",
                        rec.receipt_number,
                        rec.supplier_name,
                        rec.supplier_tin,
                        rec.nature_of_goods.as_deref().unwrap_or("-"),
                        rec.date,
                        rec.net_amount,
                        rec.vat,
                        rec.total,
                    );
                    self.record_audit(
                        actor,
                        AuditAction::Warning,
                        Some("purchases"),
                        Some(rec.id),
                        Some(&detail),
                    );
                    cancelled.push(CancelledRecord {
                        receipt_number: rec.receipt_number,
                        counterparty: rec.supplier_name,
                        date: rec.date,
                        total: rec.total,
                    });
                }
                Err(e) => {
                    error!("Failed to delete purchase {}: {}", rec.receipt_number, e);
                }
            }
        }

        let mut inserted = 0;
        for row in &plan.to_insert {
            match self.insert_purchase(row) {
                Ok(Some(_)) => inserted += 1,
                Ok(None) => {} // receipt raced into existence, idempotent skip
                Err(e) => {
                    error!("Failed to insert purchase {}: {}", row.receipt_number, e);
                }
            }
        }

        let summary = format!(
            "Imported purchases: {} inserted, {} cancelled, {} unchanged",
            inserted, deleted, plan.unchanged
        );
        self.record_audit(actor, AuditAction::Import, Some("purchases"), None, Some(&summary));

        Ok(ImportOutcome {
            inserted,
            deleted,
            unchanged: plan.unchanged,
            cancelled,
        })
    }
}
