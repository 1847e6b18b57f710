use super::ExpStore;
use crate::{error::ExpResult, follow_up_subsystem::FollowUpRecord};
use rusqlite::params;

const FOLLOW_UP_COLUMNS: &str =
    "SELECT follow_up_id, customer_id, created_at, action, description,
            employee_id, complaint_id, survey_id, outcome
     FROM follow_up";

fn follow_up_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<FollowUpRecord> {
    Ok(FollowUpRecord {
        follow_up_id: row.get(0)?,
        customer_id: row.get(1)?,
        created_at: row.get(2)?,
        action: row.get(3)?,
        description: row.get(4)?,
        employee_id: row.get(5)?,
        complaint_id: row.get(6)?,
        survey_id: row.get(7)?,
        outcome: row.get(8)?,
    })
}

impl ExpStore {
    // ── Follow-up (append-only) ───────────────────────────────────

    pub fn insert_follow_up(&self, f: &FollowUpRecord) -> ExpResult<()> {
        self.conn.execute(
            "INSERT INTO follow_up (
                follow_up_id, customer_id, created_at, action, description,
                employee_id, complaint_id, survey_id, outcome
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &f.follow_up_id,
                &f.customer_id,
                f.created_at,
                f.action,
                &f.description,
                &f.employee_id,
                f.complaint_id.as_deref(),
                f.survey_id.as_deref(),
                f.outcome.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn follow_ups_for_customer(&self, customer_id: &str) -> ExpResult<Vec<FollowUpRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FOLLOW_UP_COLUMNS} WHERE customer_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map(params![customer_id], follow_up_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn follow_ups_for_complaint(&self, complaint_id: &str) -> ExpResult<Vec<FollowUpRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FOLLOW_UP_COLUMNS} WHERE complaint_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map(params![complaint_id], follow_up_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
