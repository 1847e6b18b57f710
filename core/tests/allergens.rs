//! Allergen catalog tests: CRUD, code uniqueness, product and profile links.

use cafe_experience_core::{
    allergen_subsystem::{AllergenPatch, NewAllergen},
    clock::ExpClock,
    config::{AllergenSeed, ExpConfig},
    customer_subsystem::{CustomerRecord, ProductCategory, ProductRecord},
    engine::ExperienceEngine,
    error::ExpError,
    preference_subsystem::Preferences,
    store::ExpStore,
};
use chrono::{TimeZone, Utc};

fn engine() -> ExperienceEngine {
    let now = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();
    let engine = ExperienceEngine::build_test(ExpClock::fixed(now)).unwrap();
    engine
        .upsert_product(&ProductRecord {
            product_id: "p-croissant".into(),
            name: "Croissant".into(),
            category: ProductCategory::Food,
        })
        .unwrap();
    engine
}

fn allergen(name: &str, code: &str) -> NewAllergen {
    NewAllergen {
        name: Some(name.into()),
        code: Some(code.into()),
        ..NewAllergen::default()
    }
}

#[test]
fn create_get_update_delete() {
    let engine = engine();
    let gluten = engine.create_allergen(allergen("Gluten", "GLU")).unwrap();
    assert_eq!(engine.allergen(&gluten.allergen_id).unwrap(), Some(gluten.clone()));

    let updated = engine
        .update_allergen(
            &gluten.allergen_id,
            AllergenPatch {
                description: Some("Wheat, rye, barley".into()),
                ..AllergenPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Gluten");
    assert_eq!(updated.description.as_deref(), Some("Wheat, rye, barley"));

    engine.delete_allergen(&gluten.allergen_id).unwrap();
    assert!(engine.allergen(&gluten.allergen_id).unwrap().is_none());

    let err = engine.delete_allergen(&gluten.allergen_id).unwrap_err();
    assert!(matches!(err, ExpError::NotFound { entity: "allergen", .. }));
}

#[test]
fn name_and_code_are_required() {
    let engine = engine();
    let err = engine
        .create_allergen(NewAllergen {
            name: None,
            ..allergen("x", "X")
        })
        .unwrap_err();
    assert!(matches!(err, ExpError::Validation { field: "name", .. }));

    let err = engine.create_allergen(allergen("Milk", " ")).unwrap_err();
    assert!(matches!(err, ExpError::Validation { field: "code", .. }));
}

#[test]
fn codes_are_unique() {
    let engine = engine();
    let milk = engine.create_allergen(allergen("Milk", "MLK")).unwrap();
    let eggs = engine.create_allergen(allergen("Eggs", "EGG")).unwrap();

    let err = engine.create_allergen(allergen("Lactose", "MLK")).unwrap_err();
    assert!(matches!(err, ExpError::Validation { field: "code", .. }));

    let err = engine
        .update_allergen(
            &eggs.allergen_id,
            AllergenPatch {
                code: Some("MLK".into()),
                ..AllergenPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ExpError::Validation { field: "code", .. }));

    // Keeping its own code is not a clash.
    engine
        .update_allergen(
            &milk.allergen_id,
            AllergenPatch {
                code: Some("MLK".into()),
                ..AllergenPatch::default()
            },
        )
        .unwrap();
}

#[test]
fn products_link_and_unlink() {
    let engine = engine();
    let gluten = engine.create_allergen(allergen("Gluten", "GLU")).unwrap();
    let milk = engine.create_allergen(allergen("Milk", "MLK")).unwrap();

    engine.link_product_allergen("p-croissant", &gluten.allergen_id).unwrap();
    engine.link_product_allergen("p-croissant", &milk.allergen_id).unwrap();
    engine.link_product_allergen("p-croissant", &milk.allergen_id).unwrap();
    assert_eq!(engine.allergens_for_product("p-croissant").unwrap().len(), 2);

    engine.unlink_product_allergen("p-croissant", &milk.allergen_id).unwrap();
    let left = engine.allergens_for_product("p-croissant").unwrap();
    assert_eq!(left, vec![gluten]);

    let err = engine.link_product_allergen("p-ghost", &milk.allergen_id).unwrap_err();
    assert!(matches!(err, ExpError::NotFound { entity: "product", .. }));
}

/// Deleting an allergen drops it from every product and profile.
#[test]
fn delete_cascades_to_links() {
    let engine = engine();
    engine
        .upsert_customer(&CustomerRecord {
            customer_id: "c-1".into(),
            name: "Iris".into(),
            phone: None,
            email: None,
        })
        .unwrap();
    let nuts = engine.create_allergen(allergen("Nuts", "NUT")).unwrap();
    let soy = engine.create_allergen(allergen("Soy", "SOY")).unwrap();
    let profile = engine.create_profile("c-1", Preferences::default()).unwrap();
    engine
        .set_profile_allergens(
            &profile.profile_id,
            &[nuts.allergen_id.clone(), soy.allergen_id.clone()],
        )
        .unwrap();
    engine.link_product_allergen("p-croissant", &nuts.allergen_id).unwrap();

    engine.delete_allergen(&nuts.allergen_id).unwrap();

    let profile = engine.profile(&profile.profile_id).unwrap().unwrap();
    assert_eq!(profile.allergen_ids, vec![soy.allergen_id]);
    assert!(engine.allergens_for_product("p-croissant").unwrap().is_empty());
}

#[test]
fn profile_allergens_must_exist() {
    let engine = engine();
    engine
        .upsert_customer(&CustomerRecord {
            customer_id: "c-1".into(),
            name: "Iris".into(),
            phone: None,
            email: None,
        })
        .unwrap();
    let profile = engine.create_profile("c-1", Preferences::default()).unwrap();
    let err = engine
        .set_profile_allergens(&profile.profile_id, &["alg-ghost".to_string()])
        .unwrap_err();
    assert!(matches!(err, ExpError::NotFound { entity: "allergen", .. }));
}

/// The seed catalog loads once, into an empty table only.
#[test]
fn seed_catalog_loads_into_empty_table() {
    let now = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();
    let mut config = ExpConfig::default_test();
    config.allergen_seed = vec![
        AllergenSeed { name: "Gluten".into(), code: "GLU".into(), description: None },
        AllergenSeed { name: "Sesame".into(), code: "SES".into(), description: None },
    ];

    let engine = ExperienceEngine::build_with(ExpStore::in_memory().unwrap(), config, ExpClock::fixed(now)).unwrap();
    let codes: Vec<String> = engine.allergens().unwrap().into_iter().map(|a| a.code).collect();
    assert_eq!(codes.len(), 2);
    assert!(codes.contains(&"SES".to_string()));
    assert_eq!(engine.store().events_of_type("allergen_changed").unwrap().len(), 2);
}
