//! Operational expense operations

use rusqlite::params;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Expense, NewExpense, PaymentMode};
use crate::tax::DateWindow;

fn row_to_expense(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
    let date: String = row.get(4)?;
    let mode: String = row.get(5)?;
    Ok(Expense {
        id: row.get(0)?,
        recipient_name: row.get(1)?,
        recipient_phone: row.get(2)?,
        amount: row.get(3)?,
        date: date.parse().unwrap_or_default(),
        payment_mode: mode.parse().unwrap_or(PaymentMode::Cash),
        reason: row.get(6)?,
        project_id: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const EXPENSE_COLUMNS: &str =
    "id, recipient_name, recipient_phone, amount, date, payment_mode, reason, project_id, created_at";

impl Database {
    pub fn create_expense(&self, new: &NewExpense) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO expenses (recipient_name, recipient_phone, amount, date, payment_mode, reason, project_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                new.recipient_name,
                new.recipient_phone,
                new.amount,
                new.date.to_string(),
                new.payment_mode.as_str(),
                new.reason,
                new.project_id,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List expenses within an optional window and project filter, newest first
    pub fn list_expenses(
        &self,
        window: &DateWindow,
        project_id: Option<i64>,
    ) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
            FROM expenses
            WHERE (?1 IS NULL OR date >= ?1)
              AND (?2 IS NULL OR date <= ?2)
              AND (?3 IS NULL OR project_id = ?3)
            ORDER BY date DESC, id DESC
            "#,
            EXPENSE_COLUMNS
        ))?;

        let expenses = stmt
            .query_map(params![start, end, project_id], row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Sum of expense amounts over the same filter as `list_expenses`
    pub fn sum_expenses(&self, window: &DateWindow, project_id: Option<i64>) -> Result<f64> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        let total = conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM expenses
            WHERE (?1 IS NULL OR date >= ?1)
              AND (?2 IS NULL OR date <= ?2)
              AND (?3 IS NULL OR project_id = ?3)
            "#,
            params![start, end, project_id],
            |row| row.get(0),
        )?;

        Ok(total)
    }

    pub fn update_expense(&self, id: i64, new: &NewExpense) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            r#"
            UPDATE expenses
            SET recipient_name = ?, recipient_phone = ?, amount = ?, date = ?,
                payment_mode = ?, reason = ?, project_id = ?
            WHERE id = ?
            "#,
            params![
                new.recipient_name,
                new.recipient_phone,
                new.amount,
                new.date.to_string(),
                new.payment_mode.as_str(),
                new.reason,
                new.project_id,
                id,
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Expense {} not found", id)));
        }
        Ok(())
    }

    pub fn delete_expense(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let deleted = conn.execute("DELETE FROM expenses WHERE id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Expense {} not found", id)));
        }
        Ok(())
    }
}
