//! Project operations and dashboard totals

use rusqlite::params;
use serde::Serialize;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{NewProject, Project, ProjectStatus};

/// Headline figures for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardTotals {
    pub project_count: i64,
    pub total_contract_value: f64,
    pub total_expenses: f64,
    pub total_purchases: f64,
}

fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    let status: String = row.get(4)?;
    let start_date: Option<String> = row.get(5)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        client_name: row.get(2)?,
        contract_amount: row.get(3)?,
        status: status.parse().unwrap_or(ProjectStatus::Active),
        start_date: start_date.and_then(|s| s.parse().ok()),
        description: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const PROJECT_COLUMNS: &str =
    "id, name, client_name, contract_amount, status, start_date, description, created_at";

impl Database {
    pub fn create_project(&self, new: &NewProject) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO projects (name, client_name, contract_amount, status, start_date, description)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                new.name,
                new.client_name,
                new.contract_amount,
                new.status.as_str(),
                new.start_date.map(|d| d.to_string()),
                new.description,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_project(&self, id: i64) -> Result<Project> {
        let conn = self.conn()?;

        conn.query_row(
            &format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS),
            params![id],
            row_to_project,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("Project {} not found", id))
            }
            other => other.into(),
        })
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM projects ORDER BY created_at DESC, id DESC",
            PROJECT_COLUMNS
        ))?;

        let projects = stmt
            .query_map([], row_to_project)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    pub fn update_project(&self, id: i64, new: &NewProject) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            r#"
            UPDATE projects
            SET name = ?, client_name = ?, contract_amount = ?, status = ?, start_date = ?, description = ?
            WHERE id = ?
            "#,
            params![
                new.name,
                new.client_name,
                new.contract_amount,
                new.status.as_str(),
                new.start_date.map(|d| d.to_string()),
                new.description,
                id,
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Project {} not found", id)));
        }
        Ok(())
    }

    pub fn delete_project(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let deleted = conn.execute("DELETE FROM projects WHERE id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Project {} not found", id)));
        }
        Ok(())
    }

    /// Headline totals for the dashboard
    pub fn dashboard_totals(&self) -> Result<DashboardTotals> {
        let conn = self.conn()?;

        let (project_count, total_contract_value) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(contract_amount), 0) FROM projects",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let total_expenses = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM expenses",
            [],
            |row| row.get(0),
        )?;
        let total_purchases = conn.query_row(
            "SELECT COALESCE(SUM(total), 0) FROM purchases",
            [],
            |row| row.get(0),
        )?;

        Ok(DashboardTotals {
            project_count,
            total_contract_value,
            total_expenses,
            total_purchases,
        })
    }
}
