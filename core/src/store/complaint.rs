use super::ExpStore;
use crate::{
    complaint_subsystem::{ComplaintRecord, ComplaintStatus},
    error::ExpResult,
    types::Timestamp,
};
use rusqlite::{params, OptionalExtension};

const COMPLAINT_COLUMNS: &str =
    "SELECT complaint_id, customer_id, survey_id, created_at, kind, priority, category,
            description, action_taken, status, assignee_id, resolved_at,
            notify_customer, notified
     FROM complaint";

// Newest first; within the same instant, high priority before low.
const COMPLAINT_ORDER: &str = "ORDER BY created_at DESC,
     CASE priority WHEN 'high' THEN 2 WHEN 'medium' THEN 1 ELSE 0 END DESC,
     rowid DESC";

// Helper function for mapping complaint rows
fn complaint_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ComplaintRecord> {
    Ok(ComplaintRecord {
        complaint_id: row.get(0)?,
        customer_id: row.get(1)?,
        survey_id: row.get(2)?,
        created_at: row.get(3)?,
        kind: row.get(4)?,
        priority: row.get(5)?,
        category: row.get(6)?,
        description: row.get(7)?,
        action_taken: row.get(8)?,
        status: row.get(9)?,
        assignee_id: row.get(10)?,
        resolved_at: row.get(11)?,
        notify_customer: row.get::<_, i32>(12)? != 0,
        notified: row.get::<_, i32>(13)? != 0,
    })
}

impl ExpStore {
    // ── Complaint ──────────────────────────────────────────────────

    pub fn insert_complaint(&self, c: &ComplaintRecord) -> ExpResult<()> {
        self.conn.execute(
            "INSERT INTO complaint (
                complaint_id, customer_id, survey_id, created_at, kind, priority, category,
                description, action_taken, status, assignee_id, resolved_at,
                notify_customer, notified
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                &c.complaint_id,
                c.customer_id.as_deref(),
                c.survey_id.as_deref(),
                c.created_at,
                c.kind,
                c.priority,
                c.category,
                &c.description,
                c.action_taken.as_deref(),
                c.status,
                c.assignee_id.as_deref(),
                c.resolved_at,
                if c.notify_customer { 1i32 } else { 0i32 },
                if c.notified { 1i32 } else { 0i32 },
            ],
        )?;
        Ok(())
    }

    pub fn get_complaint(&self, complaint_id: &str) -> ExpResult<Option<ComplaintRecord>> {
        self.conn
            .query_row(
                &format!("{COMPLAINT_COLUMNS} WHERE complaint_id = ?1"),
                params![complaint_id],
                complaint_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn all_complaints(&self) -> ExpResult<Vec<ComplaintRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMPLAINT_COLUMNS} {COMPLAINT_ORDER}"))?;
        let rows = stmt.query_map([], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn complaints_with_status(&self, status: ComplaintStatus) -> ExpResult<Vec<ComplaintRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLAINT_COLUMNS} WHERE status = ?1 {COMPLAINT_ORDER}"
        ))?;
        let rows = stmt.query_map(params![status], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn complaints_for_survey(&self, survey_id: &str) -> ExpResult<Vec<ComplaintRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLAINT_COLUMNS} WHERE survey_id = ?1 {COMPLAINT_ORDER}"
        ))?;
        let rows = stmt.query_map(params![survey_id], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn complaints_for_customer(&self, customer_id: &str) -> ExpResult<Vec<ComplaintRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLAINT_COLUMNS} WHERE customer_id = ?1 {COMPLAINT_ORDER}"
        ))?;
        let rows = stmt.query_map(params![customer_id], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Resolved complaints whose customer asked to be told and has not been.
    pub fn complaints_awaiting_notification(&self) -> ExpResult<Vec<ComplaintRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLAINT_COLUMNS}
             WHERE notify_customer = 1 AND notified = 0 AND status = 'resolved'
             {COMPLAINT_ORDER}"
        ))?;
        let rows = stmt.query_map([], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn resolve_complaint(&self, complaint_id: &str, at: Timestamp) -> ExpResult<()> {
        self.conn.execute(
            "UPDATE complaint SET status = ?1, resolved_at = ?2 WHERE complaint_id = ?3",
            params![ComplaintStatus::Resolved, at, complaint_id],
        )?;
        Ok(())
    }

    pub fn set_complaint_status(&self, complaint_id: &str, status: ComplaintStatus) -> ExpResult<()> {
        self.conn.execute(
            "UPDATE complaint SET status = ?1 WHERE complaint_id = ?2",
            params![status, complaint_id],
        )?;
        Ok(())
    }

    pub fn set_complaint_action(&self, complaint_id: &str, action_taken: &str) -> ExpResult<()> {
        self.conn.execute(
            "UPDATE complaint SET action_taken = ?1 WHERE complaint_id = ?2",
            params![action_taken, complaint_id],
        )?;
        Ok(())
    }

    pub fn set_complaint_assignee(&self, complaint_id: &str, employee_id: &str) -> ExpResult<()> {
        self.conn.execute(
            "UPDATE complaint SET assignee_id = ?1 WHERE complaint_id = ?2",
            params![employee_id, complaint_id],
        )?;
        Ok(())
    }

    pub fn mark_complaint_notified(&self, complaint_id: &str) -> ExpResult<()> {
        self.conn.execute(
            "UPDATE complaint SET notified = 1 WHERE complaint_id = ?1",
            params![complaint_id],
        )?;
        Ok(())
    }

    // ── Test / summary helpers ─────────────────────────────────────

    pub fn complaint_count(&self) -> ExpResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM complaint", [], |row| row.get(0))?;
        Ok(count)
    }
}
