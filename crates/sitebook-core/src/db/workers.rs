//! Casual workers and their payments
//!
//! Withholding tax is fixed at 15% of the net amount and is computed when a
//! payment is created or updated. Historical rows are never recomputed.

use rusqlite::params;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{CasualPayment, CasualWorker, NewPayment, NewWorker, PaymentMethod, WITHHOLDING_RATE};
use crate::tax::DateWindow;

fn row_to_worker(row: &rusqlite::Row<'_>) -> rusqlite::Result<CasualWorker> {
    Ok(CasualWorker {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        id_number: row.get(3)?,
        phone: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn row_to_payment(row: &rusqlite::Row<'_>) -> rusqlite::Result<CasualPayment> {
    let work_date: String = row.get(4)?;
    let method: String = row.get(8)?;
    Ok(CasualPayment {
        id: row.get(0)?,
        worker_id: row.get(1)?,
        project_id: row.get(2)?,
        activity: row.get(3)?,
        work_date: work_date.parse().unwrap_or_default(),
        net_amount: row.get(5)?,
        tax_amount: row.get(6)?,
        total_amount: row.get(7)?,
        payment_method: method.parse().unwrap_or(PaymentMethod::Cash),
        momo_reference: row.get(9)?,
        created_at: row.get(10)?,
    })
}

const PAYMENT_COLUMNS: &str = "id, worker_id, project_id, activity, work_date, net_amount, tax_amount, total_amount, payment_method, momo_reference, created_at";

impl Database {
    pub fn create_worker(&self, new: &NewWorker) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO casual_workers (first_name, last_name, id_number, phone)
            VALUES (?, ?, ?, ?)
            "#,
            params![new.first_name, new.last_name, new.id_number, new.phone],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_worker(&self, id: i64) -> Result<CasualWorker> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT id, first_name, last_name, id_number, phone, created_at FROM casual_workers WHERE id = ?",
            params![id],
            row_to_worker,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("Worker {} not found", id))
            }
            other => other.into(),
        })
    }

    pub fn list_workers(&self) -> Result<Vec<CasualWorker>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, first_name, last_name, id_number, phone, created_at FROM casual_workers ORDER BY last_name, first_name",
        )?;

        let workers = stmt
            .query_map([], row_to_worker)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(workers)
    }

    pub fn update_worker(&self, id: i64, new: &NewWorker) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            r#"
            UPDATE casual_workers
            SET first_name = ?, last_name = ?, id_number = ?, phone = ?
            WHERE id = ?
            "#,
            params![new.first_name, new.last_name, new.id_number, new.phone, id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Worker {} not found", id)));
        }
        Ok(())
    }

    /// Create a casual payment, computing the 15% withholding and total
    pub fn create_payment(&self, new: &NewPayment) -> Result<i64> {
        let conn = self.conn()?;

        let tax_amount = new.net_amount * WITHHOLDING_RATE;
        let total_amount = new.net_amount + tax_amount;

        conn.execute(
            r#"
            INSERT INTO casual_payments (worker_id, project_id, activity, work_date, net_amount, tax_amount, total_amount, payment_method, momo_reference)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                new.worker_id,
                new.project_id,
                new.activity,
                new.work_date.to_string(),
                new.net_amount,
                tax_amount,
                total_amount,
                new.payment_method.as_str(),
                new.momo_reference,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_payment(&self, id: i64) -> Result<CasualPayment> {
        let conn = self.conn()?;

        conn.query_row(
            &format!("SELECT {} FROM casual_payments WHERE id = ?", PAYMENT_COLUMNS),
            params![id],
            row_to_payment,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("Payment {} not found", id))
            }
            other => other.into(),
        })
    }

    /// List payments within a window, optionally for one worker
    pub fn list_payments(
        &self,
        window: &DateWindow,
        worker_id: Option<i64>,
    ) -> Result<Vec<CasualPayment>> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
            FROM casual_payments
            WHERE (?1 IS NULL OR work_date >= ?1)
              AND (?2 IS NULL OR work_date <= ?2)
              AND (?3 IS NULL OR worker_id = ?3)
            ORDER BY work_date DESC, id DESC
            "#,
            PAYMENT_COLUMNS
        ))?;

        let payments = stmt
            .query_map(params![start, end, worker_id], row_to_payment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(payments)
    }

    /// Net/tax/total sums over the same filter as `list_payments`
    pub fn payment_totals(
        &self,
        window: &DateWindow,
        worker_id: Option<i64>,
    ) -> Result<(f64, f64, f64)> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        conn.query_row(
            r#"
            SELECT COALESCE(SUM(net_amount), 0), COALESCE(SUM(tax_amount), 0), COALESCE(SUM(total_amount), 0)
            FROM casual_payments
            WHERE (?1 IS NULL OR work_date >= ?1)
              AND (?2 IS NULL OR work_date <= ?2)
              AND (?3 IS NULL OR worker_id = ?3)
            "#,
            params![start, end, worker_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map_err(Into::into)
    }

    /// Update a payment, recomputing withholding from the new net amount
    pub fn update_payment(&self, id: i64, new: &NewPayment) -> Result<()> {
        let conn = self.conn()?;

        let tax_amount = new.net_amount * WITHHOLDING_RATE;
        let total_amount = new.net_amount + tax_amount;

        let updated = conn.execute(
            r#"
            UPDATE casual_payments
            SET worker_id = ?, project_id = ?, activity = ?, work_date = ?,
                net_amount = ?, tax_amount = ?, total_amount = ?, payment_method = ?, momo_reference = ?
            WHERE id = ?
            "#,
            params![
                new.worker_id,
                new.project_id,
                new.activity,
                new.work_date.to_string(),
                new.net_amount,
                tax_amount,
                total_amount,
                new.payment_method.as_str(),
                new.momo_reference,
                id,
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Payment {} not found", id)));
        }
        Ok(())
    }

    pub fn delete_payment(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let deleted = conn.execute("DELETE FROM casual_payments WHERE id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Payment {} not found", id)));
        }
        Ok(())
    }
}
