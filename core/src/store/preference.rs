use super::ExpStore;
use crate::{
    error::ExpResult,
    preference_subsystem::{Preferences, ProfileRecord, VisitStatistics},
    types::{EntityId, Timestamp},
};
use rusqlite::{params, OptionalExtension};

const PROFILE_COLUMNS: &str =
    "SELECT p.profile_id, p.customer_id, c.phone, c.email,
            p.favorite_drink_id, p.coffee_type, p.temperature, p.milk_type,
            p.sweetener, p.favorite_dish_id, p.dietary_notes,
            p.visit_count, p.total_spend, p.avg_spend_per_visit,
            p.first_visit, p.last_visit, p.is_regular,
            p.created_at, p.updated_at
     FROM preference_profile p
     JOIN customer c ON c.customer_id = p.customer_id";

// Allergen ids are loaded separately; see with_allergens().
fn profile_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRecord> {
    Ok(ProfileRecord {
        profile_id: row.get(0)?,
        customer_id: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        preferences: Preferences {
            favorite_drink_id: row.get(4)?,
            coffee_type: row.get(5)?,
            temperature: row.get(6)?,
            milk_type: row.get(7)?,
            sweetener: row.get(8)?,
            favorite_dish_id: row.get(9)?,
            dietary_notes: row.get(10)?,
        },
        allergen_ids: Vec::new(),
        stats: VisitStatistics {
            visit_count: row.get::<_, i64>(11)? as u32,
            total_spend: row.get(12)?,
            avg_spend_per_visit: row.get(13)?,
            first_visit: row.get(14)?,
            last_visit: row.get(15)?,
            is_regular: row.get::<_, i32>(16)? != 0,
        },
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

impl ExpStore {
    // ── Preference profile ────────────────────────────────────────

    pub fn insert_profile(&self, p: &ProfileRecord) -> ExpResult<()> {
        let prefs = &p.preferences;
        self.conn.execute(
            "INSERT INTO preference_profile (
                profile_id, customer_id, favorite_drink_id, coffee_type, temperature,
                milk_type, sweetener, favorite_dish_id, dietary_notes,
                visit_count, total_spend, avg_spend_per_visit, first_visit, last_visit,
                is_regular, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                &p.profile_id,
                &p.customer_id,
                prefs.favorite_drink_id.as_deref(),
                prefs.coffee_type,
                prefs.temperature,
                prefs.milk_type,
                prefs.sweetener,
                prefs.favorite_dish_id.as_deref(),
                prefs.dietary_notes.as_deref(),
                p.stats.visit_count as i64,
                p.stats.total_spend,
                p.stats.avg_spend_per_visit,
                p.stats.first_visit,
                p.stats.last_visit,
                if p.stats.is_regular { 1i32 } else { 0i32 },
                p.created_at,
                p.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_profile(&self, profile_id: &str) -> ExpResult<Option<ProfileRecord>> {
        let profile = self
            .conn
            .query_row(
                &format!("{PROFILE_COLUMNS} WHERE p.profile_id = ?1"),
                params![profile_id],
                profile_row_mapper,
            )
            .optional()?;
        profile.map(|p| self.with_allergens(p)).transpose()
    }

    pub fn profile_for_customer(&self, customer_id: &str) -> ExpResult<Option<ProfileRecord>> {
        let profile = self
            .conn
            .query_row(
                &format!("{PROFILE_COLUMNS} WHERE p.customer_id = ?1"),
                params![customer_id],
                profile_row_mapper,
            )
            .optional()?;
        profile.map(|p| self.with_allergens(p)).transpose()
    }

    /// All profiles, most recent visitors first; never-seen customers last.
    pub fn all_profiles(&self) -> ExpResult<Vec<ProfileRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROFILE_COLUMNS} ORDER BY p.last_visit IS NULL, p.last_visit DESC, p.created_at DESC"
        ))?;
        let rows = stmt
            .query_map([], profile_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(|p| self.with_allergens(p)).collect()
    }

    pub fn profile_customer_ids(&self) -> ExpResult<Vec<EntityId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT customer_id FROM preference_profile ORDER BY customer_id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_preferences(
        &self,
        profile_id: &str,
        prefs: &Preferences,
        now: Timestamp,
    ) -> ExpResult<()> {
        self.conn.execute(
            "UPDATE preference_profile
             SET favorite_drink_id = ?1, coffee_type = ?2, temperature = ?3, milk_type = ?4,
                 sweetener = ?5, favorite_dish_id = ?6, dietary_notes = ?7, updated_at = ?8
             WHERE profile_id = ?9",
            params![
                prefs.favorite_drink_id.as_deref(),
                prefs.coffee_type,
                prefs.temperature,
                prefs.milk_type,
                prefs.sweetener,
                prefs.favorite_dish_id.as_deref(),
                prefs.dietary_notes.as_deref(),
                now,
                profile_id,
            ],
        )?;
        Ok(())
    }

    pub fn update_statistics(
        &self,
        profile_id: &str,
        stats: &VisitStatistics,
        now: Timestamp,
    ) -> ExpResult<()> {
        self.conn.execute(
            "UPDATE preference_profile
             SET visit_count = ?1, total_spend = ?2, avg_spend_per_visit = ?3,
                 first_visit = ?4, last_visit = ?5, is_regular = ?6, updated_at = ?7
             WHERE profile_id = ?8",
            params![
                stats.visit_count as i64,
                stats.total_spend,
                stats.avg_spend_per_visit,
                stats.first_visit,
                stats.last_visit,
                if stats.is_regular { 1i32 } else { 0i32 },
                now,
                profile_id,
            ],
        )?;
        Ok(())
    }

    // ── Profile allergens ─────────────────────────────────────────

    pub fn set_profile_allergens(
        &self,
        profile_id: &str,
        allergen_ids: &[EntityId],
        now: Timestamp,
    ) -> ExpResult<()> {
        self.conn.execute(
            "DELETE FROM profile_allergen WHERE profile_id = ?1",
            params![profile_id],
        )?;
        for allergen_id in allergen_ids {
            self.conn.execute(
                "INSERT OR IGNORE INTO profile_allergen (profile_id, allergen_id) VALUES (?1, ?2)",
                params![profile_id, allergen_id],
            )?;
        }
        self.conn.execute(
            "UPDATE preference_profile SET updated_at = ?1 WHERE profile_id = ?2",
            params![now, profile_id],
        )?;
        Ok(())
    }

    pub fn profile_allergen_ids(&self, profile_id: &str) -> ExpResult<Vec<EntityId>> {
        let mut stmt = self.conn.prepare(
            "SELECT allergen_id FROM profile_allergen WHERE profile_id = ?1 ORDER BY allergen_id",
        )?;
        let rows = stmt.query_map(params![profile_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn with_allergens(&self, mut profile: ProfileRecord) -> ExpResult<ProfileRecord> {
        profile.allergen_ids = self.profile_allergen_ids(&profile.profile_id)?;
        Ok(profile)
    }
}
