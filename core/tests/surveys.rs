//! Satisfaction survey tests: score derivation, tiers, and the complaint
//! a low-tier survey files in the same transaction.

use cafe_experience_core::{
    clock::ExpClock,
    complaint_subsystem::{ComplaintCategory, ComplaintStatus, FeedbackKind, Priority},
    customer_subsystem::CustomerRecord,
    engine::ExperienceEngine,
    error::{ExpError, ExpResult},
    event::ExpEvent,
    store::ExpStore,
    subsystem::SurveyHook,
    survey_subsystem::{NewSurvey, RatingsInput, SatisfactionTier, SurveyRecord},
    types::Timestamp,
};
use chrono::{TimeZone, Utc};

const PLACEHOLDER: &str = "customer dissatisfied, no comment provided";

fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 14, 9, 30, 0).unwrap()
}

fn engine() -> ExperienceEngine {
    let engine = ExperienceEngine::build_test(ExpClock::fixed(now())).unwrap();
    engine
        .upsert_customer(&CustomerRecord {
            customer_id: "c-1".into(),
            name: "Marta".into(),
            phone: None,
            email: None,
        })
        .unwrap();
    engine
}

fn survey(overall: u8, food: Option<u8>, drink: Option<u8>, comment: Option<&str>) -> NewSurvey {
    NewSurvey {
        ratings: RatingsInput {
            overall: Some(overall),
            food,
            drink,
            ..RatingsInput::default()
        },
        comment: comment.map(str::to_string),
        ..NewSurvey::overall("c-1", overall)
    }
}

/// overall=2, drink=4, nothing else → 3.0 → medium, no complaint.
#[test]
fn average_covers_only_supplied_ratings() {
    let engine = engine();
    let outcome = engine.create_survey(survey(2, None, Some(4), None)).unwrap();

    assert_eq!(outcome.survey.average_score, 3.0);
    assert_eq!(outcome.survey.tier, SatisfactionTier::Medium);
    assert!(outcome.complaint.is_none());
    assert_eq!(engine.store().complaint_count().unwrap(), 0);
}

/// overall=1, drink=1 → 1.0 → low → one high-priority pending complaint.
#[test]
fn low_tier_survey_files_one_complaint() {
    let engine = engine();
    let outcome = engine
        .create_survey(survey(1, None, Some(1), Some("Cold coffee, rude staff")))
        .unwrap();

    assert_eq!(outcome.survey.average_score, 1.0);
    assert_eq!(outcome.survey.tier, SatisfactionTier::Low);

    let complaint = outcome.complaint.expect("low tier must file a complaint");
    assert_eq!(complaint.customer_id.as_deref(), Some("c-1"));
    assert_eq!(complaint.survey_id.as_deref(), Some(outcome.survey.survey_id.as_str()));
    assert_eq!(complaint.kind, FeedbackKind::Complaint);
    assert_eq!(complaint.category, ComplaintCategory::Other);
    assert_eq!(complaint.priority, Priority::High);
    assert_eq!(complaint.status, ComplaintStatus::Pending);
    assert_eq!(complaint.description, "Cold coffee, rude staff");
    assert!(complaint.resolved_at.is_none());

    let linked = engine.complaints_for_survey(&outcome.survey.survey_id).unwrap();
    assert_eq!(linked.len(), 1);
}

/// Missing and blank comments both fall back to the fixed placeholder.
#[test]
fn low_tier_without_comment_uses_placeholder() {
    let engine = engine();
    let none = engine.create_survey(survey(1, None, None, None)).unwrap();
    let blank = engine.create_survey(survey(2, Some(1), None, Some("   "))).unwrap();

    assert_eq!(none.complaint.unwrap().description, PLACEHOLDER);
    assert_eq!(blank.complaint.unwrap().description, PLACEHOLDER);
}

/// overall=5, food=5 → 5.0 → high, no complaint.
#[test]
fn high_tier_survey_files_nothing() {
    let engine = engine();
    let outcome = engine.create_survey(survey(5, Some(5), None, None)).unwrap();

    assert_eq!(outcome.survey.average_score, 5.0);
    assert_eq!(outcome.survey.tier, SatisfactionTier::High);
    assert!(outcome.complaint.is_none());
}

/// Tier boundaries: 3 is medium, 4 is high, just under 3 is low.
#[test]
fn tier_boundaries() {
    let engine = engine();
    let cases = [
        (survey(3, None, None, None), SatisfactionTier::Medium),
        (survey(4, None, None, None), SatisfactionTier::High),
        (survey(3, Some(3), Some(2), None), SatisfactionTier::Low), // 2.667
        (survey(4, Some(3), None, None), SatisfactionTier::Medium), // 3.5
    ];
    for (input, expected) in cases {
        let outcome = engine.create_survey(input).unwrap();
        assert_eq!(outcome.survey.tier, expected, "avg={}", outcome.survey.average_score);
    }
}

#[test]
fn sentiment_flags_default_to_true() {
    let engine = engine();
    let outcome = engine.create_survey(NewSurvey::overall("c-1", 4)).unwrap();
    assert!(outcome.survey.would_return);
    assert!(outcome.survey.would_recommend);
    assert_eq!(outcome.survey.surveyed_at, now());
}

/// Each survey of a batch is judged on its own tier.
#[test]
fn batch_creation_evaluates_each_survey() {
    let engine = engine();
    let outcomes = engine
        .create_surveys(vec![
            survey(1, None, None, Some("first")),
            survey(5, Some(5), None, None),
            survey(2, Some(1), None, Some("third")),
        ])
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    let descriptions: Vec<Option<String>> = outcomes
        .iter()
        .map(|o| o.complaint.as_ref().map(|c| c.description.clone()))
        .collect();
    assert_eq!(
        descriptions,
        vec![Some("first".to_string()), None, Some("third".to_string())]
    );
    assert_eq!(engine.store().complaint_count().unwrap(), 2);
    assert_eq!(engine.store().survey_count_by_tier(SatisfactionTier::Low).unwrap(), 2);
    assert_eq!(engine.complaints_for_customer("c-1").unwrap().len(), 2);
}

/// One invalid survey in a batch rolls the whole batch back.
#[test]
fn batch_with_invalid_survey_persists_nothing() {
    let engine = engine();
    let err = engine
        .create_surveys(vec![survey(1, None, None, None), survey(6, None, None, None)])
        .unwrap_err();

    assert!(matches!(err, ExpError::Validation { field: "overall", .. }));
    assert_eq!(engine.store().survey_count().unwrap(), 0);
    assert_eq!(engine.store().complaint_count().unwrap(), 0);
}

#[test]
fn missing_overall_rating_is_rejected() {
    let engine = engine();
    let input = NewSurvey {
        ratings: RatingsInput {
            food: Some(4),
            ..RatingsInput::default()
        },
        ..NewSurvey::overall("c-1", 4)
    };
    let err = engine.create_survey(input).unwrap_err();
    assert!(matches!(err, ExpError::Validation { field: "overall", .. }));
}

#[test]
fn out_of_range_rating_is_rejected() {
    let engine = engine();
    let err = engine.create_survey(survey(4, Some(0), None, None)).unwrap_err();
    assert!(matches!(err, ExpError::Validation { field: "food", .. }));
    assert_eq!(engine.store().survey_count().unwrap(), 0);
}

#[test]
fn survey_for_unknown_customer_is_rejected() {
    let engine = engine();
    let err = engine.create_survey(NewSurvey::overall("c-ghost", 3)).unwrap_err();
    assert!(matches!(err, ExpError::NotFound { entity: "customer", .. }));
}

/// Re-rating recomputes average and tier but never files a complaint.
#[test]
fn update_ratings_rederives_without_side_effect() {
    let engine = engine();
    let outcome = engine.create_survey(survey(5, None, None, None)).unwrap();

    let updated = engine
        .update_survey_ratings(
            &outcome.survey.survey_id,
            &RatingsInput {
                overall: Some(1),
                service: Some(2),
                ..RatingsInput::default()
            },
        )
        .unwrap();
    assert_eq!(updated.average_score, 1.5);
    assert_eq!(updated.tier, SatisfactionTier::Low);

    let stored = engine.survey(&outcome.survey.survey_id).unwrap().unwrap();
    assert_eq!(stored.tier, SatisfactionTier::Low);
    assert_eq!(engine.store().complaint_count().unwrap(), 0);
}

struct FailingHook;

impl SurveyHook for FailingHook {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn after_create(&self, _: &ExpStore, _: &SurveyRecord, _: Timestamp) -> ExpResult<Vec<ExpEvent>> {
        Err(ExpError::invalid("hook", "refused"))
    }
}

/// A hook error rolls back the survey and the complaint filed before it.
#[test]
fn failing_hook_rolls_back_survey_and_complaint() {
    let mut engine = engine();
    engine.register_hook(Box::new(FailingHook));

    let err = engine.create_survey(survey(1, None, None, None)).unwrap_err();
    assert!(matches!(err, ExpError::Validation { field: "hook", .. }));
    assert_eq!(engine.store().survey_count().unwrap(), 0);
    assert_eq!(engine.store().complaint_count().unwrap(), 0);
    assert_eq!(engine.store().event_count().unwrap(), 0);
}

/// Survey and auto-complaint are both audited, under their own sources.
#[test]
fn low_tier_survey_is_audited() {
    let engine = engine();
    engine.create_survey(survey(1, None, None, None)).unwrap();

    let events = engine.events().unwrap();
    let trail: Vec<(&str, &str)> = events
        .iter()
        .map(|e| (e.source.as_str(), e.event_type.as_str()))
        .collect();
    assert_eq!(
        trail,
        vec![("survey", "survey_recorded"), ("low_satisfaction", "complaint_filed")]
    );
}
