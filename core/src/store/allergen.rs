use super::ExpStore;
use crate::{allergen_subsystem::AllergenRecord, error::ExpResult};
use rusqlite::{params, OptionalExtension};

const ALLERGEN_COLUMNS: &str = "SELECT allergen_id, name, code, description, icon FROM allergen";

fn allergen_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<AllergenRecord> {
    Ok(AllergenRecord {
        allergen_id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
        icon: row.get(4)?,
    })
}

impl ExpStore {
    // ── Allergen catalog ──────────────────────────────────────────

    pub fn insert_allergen(&self, a: &AllergenRecord) -> ExpResult<()> {
        self.conn.execute(
            "INSERT INTO allergen (allergen_id, name, code, description, icon)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &a.allergen_id,
                &a.name,
                &a.code,
                a.description.as_deref(),
                a.icon.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn update_allergen(&self, a: &AllergenRecord) -> ExpResult<()> {
        self.conn.execute(
            "UPDATE allergen SET name = ?1, code = ?2, description = ?3, icon = ?4
             WHERE allergen_id = ?5",
            params![
                &a.name,
                &a.code,
                a.description.as_deref(),
                a.icon.as_deref(),
                &a.allergen_id,
            ],
        )?;
        Ok(())
    }

    pub fn delete_allergen(&self, allergen_id: &str) -> ExpResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM allergen WHERE allergen_id = ?1",
            params![allergen_id],
        )?;
        Ok(deleted)
    }

    pub fn get_allergen(&self, allergen_id: &str) -> ExpResult<Option<AllergenRecord>> {
        self.conn
            .query_row(
                &format!("{ALLERGEN_COLUMNS} WHERE allergen_id = ?1"),
                params![allergen_id],
                allergen_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn allergen_by_code(&self, code: &str) -> ExpResult<Option<AllergenRecord>> {
        self.conn
            .query_row(
                &format!("{ALLERGEN_COLUMNS} WHERE code = ?1"),
                params![code],
                allergen_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn all_allergens(&self) -> ExpResult<Vec<AllergenRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ALLERGEN_COLUMNS} ORDER BY name ASC"))?;
        let rows = stmt.query_map([], allergen_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn allergen_count(&self) -> ExpResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM allergen", [], |row| row.get(0))?;
        Ok(count)
    }

    // ── Product ↔ allergen ────────────────────────────────────────

    pub fn link_product_allergen(&self, product_id: &str, allergen_id: &str) -> ExpResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO product_allergen (product_id, allergen_id) VALUES (?1, ?2)",
            params![product_id, allergen_id],
        )?;
        Ok(())
    }

    pub fn unlink_product_allergen(&self, product_id: &str, allergen_id: &str) -> ExpResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM product_allergen WHERE product_id = ?1 AND allergen_id = ?2",
            params![product_id, allergen_id],
        )?;
        Ok(removed)
    }

    pub fn allergens_for_product(&self, product_id: &str) -> ExpResult<Vec<AllergenRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.allergen_id, a.name, a.code, a.description, a.icon
             FROM allergen a
             JOIN product_allergen pa ON pa.allergen_id = a.allergen_id
             WHERE pa.product_id = ?1
             ORDER BY a.name ASC",
        )?;
        let rows = stmt.query_map(params![product_id], allergen_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
