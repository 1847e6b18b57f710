//! Follow-up log tests. The log is append-only: create and list, nothing else.

use cafe_experience_core::{
    clock::ExpClock,
    complaint_subsystem::{ComplaintCategory, FeedbackKind, NewComplaint},
    customer_subsystem::{CustomerRecord, EmployeeRecord},
    engine::ExperienceEngine,
    error::ExpError,
    follow_up_subsystem::{FollowUpAction, NewFollowUp},
};
use chrono::{Duration, TimeZone, Utc};

fn engine() -> ExperienceEngine {
    let start = Utc.with_ymd_and_hms(2024, 8, 20, 16, 0, 0).unwrap();
    let engine = ExperienceEngine::build_test(ExpClock::fixed(start)).unwrap();
    engine
        .upsert_customer(&CustomerRecord {
            customer_id: "c-1".into(),
            name: "Nora".into(),
            phone: Some("555-0101".into()),
            email: None,
        })
        .unwrap();
    engine
        .upsert_employee(&EmployeeRecord {
            employee_id: "e-1".into(),
            name: "Manager".into(),
        })
        .unwrap();
    engine
}

fn follow_up(description: &str) -> NewFollowUp {
    NewFollowUp {
        customer_id: Some("c-1".into()),
        action: Some(FollowUpAction::Call),
        description: Some(description.into()),
        employee_id: Some("e-1".into()),
        ..NewFollowUp::default()
    }
}

#[test]
fn follow_up_is_logged_against_a_complaint() {
    let engine = engine();
    let complaint = engine
        .file_complaint(NewComplaint {
            customer_id: Some("c-1".into()),
            kind: Some(FeedbackKind::Claim),
            category: Some(ComplaintCategory::Price),
            description: Some("Charged twice".into()),
            ..NewComplaint::default()
        })
        .unwrap();

    let logged = engine
        .log_follow_up(NewFollowUp {
            complaint_id: Some(complaint.complaint_id.clone()),
            outcome: Some("Refund issued".into()),
            ..follow_up("Called about the double charge")
        })
        .unwrap();

    assert_eq!(logged.action, FollowUpAction::Call);
    assert_eq!(logged.outcome.as_deref(), Some("Refund issued"));
    let for_complaint = engine.follow_ups_for_complaint(&complaint.complaint_id).unwrap();
    assert_eq!(for_complaint, vec![logged]);
}

/// Action type, description and staff member are all required.
#[test]
fn required_fields_are_enforced() {
    let engine = engine();
    let cases = [
        (NewFollowUp { action: None, ..follow_up("x") }, "action"),
        (NewFollowUp { description: Some(" ".into()), ..follow_up("x") }, "description"),
        (NewFollowUp { description: None, ..follow_up("x") }, "description"),
        (NewFollowUp { employee_id: None, ..follow_up("x") }, "employee_id"),
        (NewFollowUp { customer_id: None, ..follow_up("x") }, "customer_id"),
    ];
    for (input, field) in cases {
        match engine.log_follow_up(input) {
            Err(ExpError::Validation { field: f, .. }) => assert_eq!(f, field),
            other => panic!("expected validation failure on {field}, got {other:?}"),
        }
    }
    assert!(engine.follow_ups_for_customer("c-1").unwrap().is_empty());
}

#[test]
fn unknown_staff_member_is_rejected() {
    let engine = engine();
    let err = engine
        .log_follow_up(NewFollowUp {
            employee_id: Some("e-ghost".into()),
            ..follow_up("x")
        })
        .unwrap_err();
    assert!(matches!(err, ExpError::NotFound { entity: "employee", .. }));
}

#[test]
fn follow_ups_list_newest_first() {
    let mut engine = engine();
    let first = engine.log_follow_up(follow_up("first call")).unwrap();
    engine.clock_mut().advance(Duration::days(1));
    let second = engine
        .log_follow_up(NewFollowUp {
            action: Some(FollowUpAction::Compensation),
            ..follow_up("voucher sent")
        })
        .unwrap();

    let listed = engine.follow_ups_for_customer("c-1").unwrap();
    let ids: Vec<&str> = listed.iter().map(|f| f.follow_up_id.as_str()).collect();
    assert_eq!(ids, vec![second.follow_up_id.as_str(), first.follow_up_id.as_str()]);
}
