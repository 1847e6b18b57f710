//! The JSON command surface the runner exposes, and the audit trail it leaves.

use cafe_experience_core::{
    clock::ExpClock,
    command::ExpCommand,
    engine::ExperienceEngine,
    error::ExpError,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn engine() -> ExperienceEngine {
    let now = Utc.with_ymd_and_hms(2024, 9, 9, 9, 0, 0).unwrap();
    ExperienceEngine::build_test(ExpClock::fixed(now)).unwrap()
}

fn run(engine: &ExperienceEngine, command: serde_json::Value) -> serde_json::Value {
    let command: ExpCommand = serde_json::from_value(command).unwrap();
    engine.apply(command).unwrap()
}

/// Host records, an order, a profile and a low survey, all over JSON.
#[test]
fn full_flow_through_commands() {
    let engine = engine();
    run(&engine, json!({
        "cmd": "upsert_customer",
        "customer": { "customer_id": "c-1", "name": "Pau", "email": "pau@example.com" }
    }));
    run(&engine, json!({
        "cmd": "create_profile",
        "customer_id": "c-1",
        "preferences": { "coffee_type": "cortado", "sweetener": "none" }
    }));
    let profile = run(&engine, json!({
        "cmd": "record_order",
        "order": {
            "order_id": "o-1", "customer_id": "c-1", "state": "paid",
            "amount_total": 4.5, "ordered_at": "2024-09-08T08:15:00Z"
        }
    }));
    assert_eq!(profile["visit_count"], 1);
    assert_eq!(profile["coffee_type"], "cortado");
    assert_eq!(profile["sweetener"], "none");
    assert_eq!(profile["email"], "pau@example.com");

    let outcome = run(&engine, json!({
        "cmd": "create_survey",
        "survey": { "customer_id": "c-1", "overall": 1, "drink": 1 }
    }));
    assert_eq!(outcome["survey"]["tier"], "low");
    assert_eq!(outcome["survey"]["average_score"], 1.0);
    assert_eq!(outcome["complaint"]["priority"], "high");
    assert_eq!(outcome["complaint"]["category"], "other");

    let complaint_id = outcome["complaint"]["complaint_id"].as_str().unwrap().to_string();
    let resolved = run(&engine, json!({ "cmd": "resolve_complaint", "complaint_id": complaint_id }));
    assert_eq!(resolved["status"], "resolved");
    assert!(!resolved["resolved_at"].is_null());
}

#[test]
fn unknown_enum_value_fails_to_parse() {
    let parsed: Result<ExpCommand, _> = serde_json::from_value(json!({
        "cmd": "set_complaint_status",
        "complaint_id": "cmp-1",
        "status": "escalated"
    }));
    assert!(parsed.is_err());
}

#[test]
fn command_errors_surface_unchanged() {
    let engine = engine();
    let command: ExpCommand =
        serde_json::from_value(json!({ "cmd": "recompute_statistics", "customer_id": "c-9" })).unwrap();
    let err = engine.apply(command).unwrap_err();
    assert!(matches!(err, ExpError::NotFound { .. }));
}

/// Reads leave no trace; every write appends at least one event.
#[test]
fn only_writes_are_audited() {
    let engine = engine();
    run(&engine, json!({ "cmd": "list_allergens" }));
    run(&engine, json!({ "cmd": "list_complaints" }));
    assert_eq!(engine.store().event_count().unwrap(), 0);

    run(&engine, json!({
        "cmd": "create_allergen",
        "allergen": { "name": "Lupin", "code": "LUP" }
    }));
    let events = engine.events().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].source, "allergen");
    assert_eq!(events[0].event_type, "allergen_changed");
}
