//! Allergen reference catalog and its links to products.
//! Plain master data: no derived fields.

use crate::{
    config::AllergenSeed,
    error::{ExpError, ExpResult},
    event::ExpEvent,
    store::ExpStore,
    types::{new_id, EntityId, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllergenRecord {
    pub allergen_id: EntityId,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAllergen {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<Vec<u8>>,
}

/// Fields left as None are kept unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllergenPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<Vec<u8>>,
}

pub struct AllergenSubsystem;

impl AllergenSubsystem {
    pub fn new() -> Self {
        Self
    }

    fn changed(allergen_id: &str, change: &str, now: Timestamp) -> ExpEvent {
        ExpEvent::AllergenChanged {
            at: now,
            allergen_id: allergen_id.to_string(),
            change: change.to_string(),
        }
    }

    fn check_code_free(store: &ExpStore, code: &str, owner: Option<&str>) -> ExpResult<()> {
        match store.allergen_by_code(code)? {
            Some(existing) if Some(existing.allergen_id.as_str()) != owner => Err(
                ExpError::invalid("code", format!("code '{code}' is already used by '{}'", existing.name)),
            ),
            _ => Ok(()),
        }
    }

    pub fn create(
        &self,
        store: &ExpStore,
        input: NewAllergen,
        now: Timestamp,
    ) -> ExpResult<(AllergenRecord, Vec<ExpEvent>)> {
        let name = input
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ExpError::missing("name"))?;
        let code = input
            .code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ExpError::missing("code"))?;
        Self::check_code_free(store, &code, None)?;

        let record = AllergenRecord {
            allergen_id: new_id("alg"),
            name,
            code,
            description: input.description,
            icon: input.icon,
        };
        store.insert_allergen(&record)?;
        log::info!("allergen {} ({}) added", record.code, record.name);

        let events = vec![Self::changed(&record.allergen_id, "created", now)];
        Ok((record, events))
    }

    pub fn update(
        &self,
        store: &ExpStore,
        allergen_id: &str,
        patch: AllergenPatch,
        now: Timestamp,
    ) -> ExpResult<(AllergenRecord, Vec<ExpEvent>)> {
        let current = store
            .get_allergen(allergen_id)?
            .ok_or_else(|| ExpError::not_found("allergen", allergen_id))?;

        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(ExpError::missing("name"));
            }
        }
        if let Some(code) = &patch.code {
            if code.trim().is_empty() {
                return Err(ExpError::missing("code"));
            }
            Self::check_code_free(store, code.trim(), Some(allergen_id))?;
        }

        let record = AllergenRecord {
            allergen_id: current.allergen_id,
            name: patch.name.map(|n| n.trim().to_string()).unwrap_or(current.name),
            code: patch.code.map(|c| c.trim().to_string()).unwrap_or(current.code),
            description: patch.description.or(current.description),
            icon: patch.icon.or(current.icon),
        };
        store.update_allergen(&record)?;

        let events = vec![Self::changed(allergen_id, "updated", now)];
        Ok((record, events))
    }

    /// Administrative removal. Product and profile links go with it.
    pub fn delete(
        &self,
        store: &ExpStore,
        allergen_id: &str,
        now: Timestamp,
    ) -> ExpResult<Vec<ExpEvent>> {
        if store.delete_allergen(allergen_id)? == 0 {
            return Err(ExpError::not_found("allergen", allergen_id));
        }
        log::info!("allergen {allergen_id} deleted");
        Ok(vec![Self::changed(allergen_id, "deleted", now)])
    }

    pub fn link_product(
        &self,
        store: &ExpStore,
        product_id: &str,
        allergen_id: &str,
        now: Timestamp,
    ) -> ExpResult<Vec<ExpEvent>> {
        if store.get_product(product_id)?.is_none() {
            return Err(ExpError::not_found("product", product_id));
        }
        if store.get_allergen(allergen_id)?.is_none() {
            return Err(ExpError::not_found("allergen", allergen_id));
        }
        store.link_product_allergen(product_id, allergen_id)?;
        Ok(vec![Self::changed(
            allergen_id,
            &format!("linked to product {product_id}"),
            now,
        )])
    }

    pub fn unlink_product(
        &self,
        store: &ExpStore,
        product_id: &str,
        allergen_id: &str,
        now: Timestamp,
    ) -> ExpResult<Vec<ExpEvent>> {
        if store.unlink_product_allergen(product_id, allergen_id)? == 0 {
            return Ok(vec![]);
        }
        Ok(vec![Self::changed(
            allergen_id,
            &format!("unlinked from product {product_id}"),
            now,
        )])
    }

    /// Load the seed catalog into an empty table. Returns the rows added.
    pub fn seed(
        &self,
        store: &ExpStore,
        seeds: &[AllergenSeed],
        now: Timestamp,
    ) -> ExpResult<(usize, Vec<ExpEvent>)> {
        if store.allergen_count()? > 0 {
            return Ok((0, vec![]));
        }
        let mut events = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let input = NewAllergen {
                name: Some(seed.name.clone()),
                code: Some(seed.code.clone()),
                description: seed.description.clone(),
                icon: None,
            };
            let (_, mut created) = self.create(store, input, now)?;
            events.append(&mut created);
        }
        log::debug!("seeded {} allergens", seeds.len());
        Ok((seeds.len(), events))
    }
}

impl Default for AllergenSubsystem {
    fn default() -> Self {
        Self::new()
    }
}
