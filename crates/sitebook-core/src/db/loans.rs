//! Loans and repayments
//!
//! A loan flips to Cleared automatically once repayments reach the total.

use rusqlite::params;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Loan, LoanPayment, LoanStatus, NewLoan};

fn row_to_loan(row: &rusqlite::Row<'_>) -> rusqlite::Result<Loan> {
    let date_borrowed: String = row.get(5)?;
    let status: String = row.get(6)?;
    Ok(Loan {
        id: row.get(0)?,
        lender_name: row.get(1)?,
        description: row.get(2)?,
        total_amount: row.get(3)?,
        amount_paid: row.get(4)?,
        date_borrowed: date_borrowed.parse().unwrap_or_default(),
        status: status.parse().unwrap_or(LoanStatus::Active),
        created_at: row.get(7)?,
    })
}

const LOAN_COLUMNS: &str =
    "id, lender_name, description, total_amount, amount_paid, date_borrowed, status, created_at";

impl Database {
    pub fn create_loan(&self, new: &NewLoan) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO loans (lender_name, description, total_amount, date_borrowed)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                new.lender_name,
                new.description,
                new.total_amount,
                new.date_borrowed.to_string(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_loan(&self, id: i64) -> Result<Loan> {
        let conn = self.conn()?;

        conn.query_row(
            &format!("SELECT {} FROM loans WHERE id = ?", LOAN_COLUMNS),
            params![id],
            row_to_loan,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("Loan {} not found", id))
            }
            other => other.into(),
        })
    }

    pub fn list_loans(&self) -> Result<Vec<Loan>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM loans ORDER BY date_borrowed DESC, id DESC",
            LOAN_COLUMNS
        ))?;

        let loans = stmt
            .query_map([], row_to_loan)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(loans)
    }

    pub fn update_loan(&self, id: i64, new: &NewLoan) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            r#"
            UPDATE loans
            SET lender_name = ?, description = ?, total_amount = ?, date_borrowed = ?,
                status = CASE WHEN amount_paid >= ? THEN 'Cleared' ELSE 'Active' END
            WHERE id = ?
            "#,
            params![
                new.lender_name,
                new.description,
                new.total_amount,
                new.date_borrowed.to_string(),
                new.total_amount,
                id,
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Loan {} not found", id)));
        }
        Ok(())
    }

    pub fn delete_loan(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let deleted = conn.execute("DELETE FROM loans WHERE id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Loan {} not found", id)));
        }
        Ok(())
    }

    /// Record a repayment and update the loan balance, auto-clearing when
    /// repayments reach the total
    pub fn add_loan_payment(
        &self,
        loan_id: i64,
        amount: f64,
        date: chrono::NaiveDate,
        note: Option<&str>,
    ) -> Result<Loan> {
        let conn = self.conn()?;

        let exists: Option<i64> = conn
            .query_row("SELECT id FROM loans WHERE id = ?", params![loan_id], |row| {
                row.get(0)
            })
            .ok();
        if exists.is_none() {
            return Err(Error::NotFound(format!("Loan {} not found", loan_id)));
        }

        conn.execute(
            "INSERT INTO loan_payments (loan_id, amount, date, note) VALUES (?, ?, ?, ?)",
            params![loan_id, amount, date.to_string(), note],
        )?;

        conn.execute(
            r#"
            UPDATE loans
            SET amount_paid = amount_paid + ?,
                status = CASE WHEN amount_paid + ? >= total_amount THEN 'Cleared' ELSE 'Active' END
            WHERE id = ?
            "#,
            params![amount, amount, loan_id],
        )?;

        drop(conn);
        self.get_loan(loan_id)
    }

    pub fn list_loan_payments(&self, loan_id: i64) -> Result<Vec<LoanPayment>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, loan_id, amount, date, note FROM loan_payments WHERE loan_id = ? ORDER BY date, id",
        )?;

        let payments = stmt
            .query_map(params![loan_id], |row| {
                let date: String = row.get(3)?;
                Ok(LoanPayment {
                    id: row.get(0)?,
                    loan_id: row.get(1)?,
                    amount: row.get(2)?,
                    date: date.parse().unwrap_or_default(),
                    note: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(payments)
    }
}
