//! Audit log operations

use rusqlite::params;
use tracing::error;

use super::{AuditEntry, Database};
use crate::error::Result;
use crate::models::AuditAction;
use crate::tax::DateWindow;

impl Database {
    /// Write an audit log entry, returning the new row id
    pub fn log_audit(
        &self,
        actor: &str,
        action: AuditAction,
        module: Option<&str>,
        target_id: Option<i64>,
        detail: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO audit_log (actor, action, module, target_id, detail)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![actor, action.as_str(), module, target_id, detail],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Best-effort audit write
    ///
    /// A failed write is logged and swallowed; it never propagates to the
    /// caller's primary operation.
    pub fn record_audit(
        &self,
        actor: &str,
        action: AuditAction,
        module: Option<&str>,
        target_id: Option<i64>,
        detail: Option<&str>,
    ) {
        if let Err(e) = self.log_audit(actor, action, module, target_id, detail) {
            error!(
                action = action.as_str(),
                module = module.unwrap_or(""),
                "Failed to write audit entry: {}",
                e
            );
        }
    }

    /// List audit log entries, newest first, within an optional date window
    pub fn list_audit_log(
        &self,
        window: &DateWindow,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditEntry>> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        let mut stmt = conn.prepare(
            r#"
            SELECT id, timestamp, actor, action, module, target_id, detail
            FROM audit_log
            WHERE (?1 IS NULL OR date(timestamp) >= ?1)
              AND (?2 IS NULL OR date(timestamp) <= ?2)
            ORDER BY timestamp DESC, id DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )?;

        let entries = stmt
            .query_map(params![start, end, limit, offset], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    actor: row.get(2)?,
                    action: row.get(3)?,
                    module: row.get(4)?,
                    target_id: row.get(5)?,
                    detail: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Count audit log entries within an optional date window
    pub fn count_audit_log(&self, window: &DateWindow) -> Result<i64> {
        let conn = self.conn()?;
        let (start, end) = window.bound_strings();

        let count = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM audit_log
            WHERE (?1 IS NULL OR date(timestamp) >= ?1)
              AND (?2 IS NULL OR date(timestamp) <= ?2)
            "#,
            params![start, end],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// Delete every audit log entry, returning the number removed
    pub fn clear_audit_log(&self) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM audit_log", [])?;
        Ok(deleted)
    }
}
