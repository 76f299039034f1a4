//! Client invoices with sequential monthly numbering
//!
//! Numbers take the form INV-YYYY/MM/NNN, restarting at 001 each month.
//! Line totals, subtotal, 18% VAT and the grand total are always computed
//! server-side from the submitted items.

use chrono::Datelike;
use rusqlite::params;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Invoice, InvoiceItem, NewInvoice, INVOICE_VAT_RATE};

fn row_to_invoice(row: &rusqlite::Row<'_>) -> rusqlite::Result<Invoice> {
    let date: String = row.get(4)?;
    Ok(Invoice {
        id: row.get(0)?,
        number: row.get(1)?,
        client_name: row.get(2)?,
        site_location: row.get(3)?,
        date: date.parse().unwrap_or_default(),
        project_id: row.get(5)?,
        subtotal: row.get(6)?,
        vat: row.get(7)?,
        total: row.get(8)?,
        created_at: row.get(9)?,
        items: Vec::new(),
    })
}

const INVOICE_COLUMNS: &str =
    "id, number, client_name, site_location, date, project_id, subtotal, vat, total, created_at";

impl Database {
    /// Next sequential number for the invoice's month, one past the highest
    /// suffix ever issued. Deleted invoices leave a gap rather than freeing
    /// their number for reuse.
    fn next_invoice_number(&self, date: chrono::NaiveDate) -> Result<String> {
        let conn = self.conn()?;

        let prefix = format!("INV-{}/{:02}/", date.year(), date.month());
        let last: Option<i64> = conn.query_row(
            "SELECT MAX(CAST(substr(number, ?2) AS INTEGER)) FROM invoices WHERE number LIKE ?1 || '%'",
            params![prefix, prefix.len() as i64 + 1],
            |row| row.get(0),
        )?;

        Ok(format!("{}{:03}", prefix, last.unwrap_or(0) + 1))
    }

    pub fn create_invoice(&self, new: &NewInvoice) -> Result<Invoice> {
        if new.items.is_empty() {
            return Err(Error::InvalidData("Invoice needs at least one item".into()));
        }

        let number = self.next_invoice_number(new.date)?;
        let subtotal: f64 = new.items.iter().map(|i| i.quantity * i.unit_price).sum();
        let vat = subtotal * INVOICE_VAT_RATE;
        let total = subtotal + vat;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO invoices (number, client_name, site_location, date, project_id, subtotal, vat, total)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                number,
                new.client_name,
                new.site_location,
                new.date.to_string(),
                new.project_id,
                subtotal,
                vat,
                total,
            ],
        )?;
        let invoice_id = conn.last_insert_rowid();

        for item in &new.items {
            conn.execute(
                r#"
                INSERT INTO invoice_items (invoice_id, name, specs, unit, quantity, unit_price, line_total)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    invoice_id,
                    item.name,
                    item.specs,
                    item.unit,
                    item.quantity,
                    item.unit_price,
                    item.quantity * item.unit_price,
                ],
            )?;
        }

        drop(conn);
        self.get_invoice(invoice_id)
    }

    pub fn get_invoice(&self, id: i64) -> Result<Invoice> {
        let conn = self.conn()?;

        let mut invoice = conn
            .query_row(
                &format!("SELECT {} FROM invoices WHERE id = ?", INVOICE_COLUMNS),
                params![id],
                row_to_invoice,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    Error::NotFound(format!("Invoice {} not found", id))
                }
                other => other.into(),
            })?;

        let mut stmt = conn.prepare(
            "SELECT id, invoice_id, name, specs, unit, quantity, unit_price, line_total FROM invoice_items WHERE invoice_id = ? ORDER BY id",
        )?;
        invoice.items = stmt
            .query_map(params![id], |row| {
                Ok(InvoiceItem {
                    id: row.get(0)?,
                    invoice_id: row.get(1)?,
                    name: row.get(2)?,
                    specs: row.get(3)?,
                    unit: row.get(4)?,
                    quantity: row.get(5)?,
                    unit_price: row.get(6)?,
                    line_total: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(invoice)
    }

    /// List invoices without their items, newest first
    pub fn list_invoices(&self) -> Result<Vec<Invoice>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM invoices ORDER BY date DESC, id DESC",
            INVOICE_COLUMNS
        ))?;

        let invoices = stmt
            .query_map([], row_to_invoice)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(invoices)
    }

    /// Replace an invoice's fields and items, keeping its number
    pub fn update_invoice(&self, id: i64, new: &NewInvoice) -> Result<Invoice> {
        if new.items.is_empty() {
            return Err(Error::InvalidData("Invoice needs at least one item".into()));
        }

        let subtotal: f64 = new.items.iter().map(|i| i.quantity * i.unit_price).sum();
        let vat = subtotal * INVOICE_VAT_RATE;
        let total = subtotal + vat;

        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE invoices
            SET client_name = ?, site_location = ?, date = ?, project_id = ?, subtotal = ?, vat = ?, total = ?
            WHERE id = ?
            "#,
            params![
                new.client_name,
                new.site_location,
                new.date.to_string(),
                new.project_id,
                subtotal,
                vat,
                total,
                id,
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("Invoice {} not found", id)));
        }

        conn.execute("DELETE FROM invoice_items WHERE invoice_id = ?", params![id])?;
        for item in &new.items {
            conn.execute(
                r#"
                INSERT INTO invoice_items (invoice_id, name, specs, unit, quantity, unit_price, line_total)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    id,
                    item.name,
                    item.specs,
                    item.unit,
                    item.quantity,
                    item.unit_price,
                    item.quantity * item.unit_price,
                ],
            )?;
        }

        drop(conn);
        self.get_invoice(id)
    }

    pub fn delete_invoice(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let deleted = conn.execute("DELETE FROM invoices WHERE id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Invoice {} not found", id)));
        }
        Ok(())
    }
}
