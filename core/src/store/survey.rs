use super::ExpStore;
use crate::{
    error::ExpResult,
    survey_subsystem::{SatisfactionTier, SurveyRatings, SurveyRecord},
};
use rusqlite::{params, OptionalExtension};

fn survey_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<SurveyRecord> {
    Ok(SurveyRecord {
        survey_id: row.get(0)?,
        customer_id: row.get(1)?,
        order_id: row.get(2)?,
        surveyed_at: row.get(3)?,
        ratings: SurveyRatings {
            overall: row.get(4)?,
            food: row.get(5)?,
            drink: row.get(6)?,
            service: row.get(7)?,
            ambience: row.get(8)?,
        },
        would_return: row.get::<_, i32>(9)? != 0,
        would_recommend: row.get::<_, i32>(10)? != 0,
        comment: row.get(11)?,
        average_score: row.get(12)?,
        tier: row.get(13)?,
    })
}

impl ExpStore {
    // ── Survey ────────────────────────────────────────────────────

    pub fn insert_survey(&self, s: &SurveyRecord) -> ExpResult<()> {
        self.conn.execute(
            "INSERT INTO survey (
                survey_id, customer_id, order_id, surveyed_at,
                overall, food, drink, service, ambience,
                would_return, would_recommend, comment, average_score, tier
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                &s.survey_id,
                &s.customer_id,
                s.order_id.as_deref(),
                s.surveyed_at,
                s.ratings.overall,
                s.ratings.food,
                s.ratings.drink,
                s.ratings.service,
                s.ratings.ambience,
                if s.would_return { 1i32 } else { 0i32 },
                if s.would_recommend { 1i32 } else { 0i32 },
                s.comment.as_deref(),
                s.average_score,
                s.tier,
            ],
        )?;
        Ok(())
    }

    pub fn get_survey(&self, survey_id: &str) -> ExpResult<Option<SurveyRecord>> {
        self.conn
            .query_row(
                "SELECT survey_id, customer_id, order_id, surveyed_at,
                        overall, food, drink, service, ambience,
                        would_return, would_recommend, comment, average_score, tier
                 FROM survey WHERE survey_id = ?1",
                params![survey_id],
                survey_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Surveys of one customer, newest first.
    pub fn surveys_for_customer(&self, customer_id: &str) -> ExpResult<Vec<SurveyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT survey_id, customer_id, order_id, surveyed_at,
                    overall, food, drink, service, ambience,
                    would_return, would_recommend, comment, average_score, tier
             FROM survey WHERE customer_id = ?1
             ORDER BY surveyed_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![customer_id], survey_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_survey_ratings(
        &self,
        survey_id: &str,
        ratings: &SurveyRatings,
        average_score: f64,
        tier: SatisfactionTier,
    ) -> ExpResult<()> {
        self.conn.execute(
            "UPDATE survey
             SET overall = ?1, food = ?2, drink = ?3, service = ?4, ambience = ?5,
                 average_score = ?6, tier = ?7
             WHERE survey_id = ?8",
            params![
                ratings.overall,
                ratings.food,
                ratings.drink,
                ratings.service,
                ratings.ambience,
                average_score,
                tier,
                survey_id,
            ],
        )?;
        Ok(())
    }

    // ── Test / summary helpers ─────────────────────────────────────

    pub fn survey_count(&self) -> ExpResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM survey", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn survey_count_by_tier(&self, tier: SatisfactionTier) -> ExpResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM survey WHERE tier = ?1",
            params![tier],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
