//! Complaints, suggestions, claims and compliments.
//!
//! Records are filed by staff or, through LowSatisfactionHook, as a side
//! effect of a survey landing in the low tier. Status moves
//! pending → in_progress → resolved → closed, but writes are not guarded:
//! any state may be set directly and `resolve` works from any state.

use crate::{
    error::{ExpError, ExpResult},
    event::ExpEvent,
    store::ExpStore,
    subsystem::SurveyHook,
    survey_subsystem::{SatisfactionTier, SurveyRecord},
    types::{new_id, text_enum, EntityId, Timestamp},
};
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum FeedbackKind {
        Complaint  => "complaint",
        Suggestion => "suggestion",
        Claim      => "claim",
        Compliment => "compliment",
    }
}

text_enum! {
    pub enum Priority {
        Low    => "low",
        Medium => "medium",
        High   => "high",
    }
}

text_enum! {
    pub enum ComplaintCategory {
        Service     => "service",
        Food        => "food",
        Drink       => "drink",
        Cleanliness => "cleanliness",
        Price       => "price",
        WaitingTime => "waiting_time",
        Facilities  => "facilities",
        Other       => "other",
    }
}

text_enum! {
    pub enum ComplaintStatus {
        Pending    => "pending",
        InProgress => "in_progress",
        Resolved   => "resolved",
        Closed     => "closed",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplaintRecord {
    pub complaint_id: EntityId,
    pub customer_id: Option<EntityId>,
    pub survey_id: Option<EntityId>,
    pub created_at: Timestamp,
    pub kind: FeedbackKind,
    pub priority: Priority,
    pub category: ComplaintCategory,
    pub description: String,
    pub action_taken: Option<String>,
    pub status: ComplaintStatus,
    pub assignee_id: Option<EntityId>,
    pub resolved_at: Option<Timestamp>,
    pub notify_customer: bool,
    /// Set by the messaging integration, never by this module's rules.
    pub notified: bool,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComplaint {
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    #[serde(default)]
    pub survey_id: Option<EntityId>,
    #[serde(default)]
    pub kind: Option<FeedbackKind>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<ComplaintCategory>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub action_taken: Option<String>,
    #[serde(default)]
    pub status: Option<ComplaintStatus>,
    #[serde(default)]
    pub assignee_id: Option<EntityId>,
    #[serde(default = "yes")]
    pub notify_customer: bool,
}

impl Default for NewComplaint {
    fn default() -> Self {
        Self {
            customer_id: None,
            survey_id: None,
            kind: None,
            priority: None,
            category: None,
            description: None,
            action_taken: None,
            status: None,
            assignee_id: None,
            notify_customer: true,
        }
    }
}

pub struct ComplaintSubsystem;

impl ComplaintSubsystem {
    pub fn new() -> Self {
        Self
    }

    fn load(store: &ExpStore, complaint_id: &str) -> ExpResult<ComplaintRecord> {
        store
            .get_complaint(complaint_id)?
            .ok_or_else(|| ExpError::not_found("complaint", complaint_id))
    }

    fn check_employee(store: &ExpStore, employee_id: &str) -> ExpResult<()> {
        if !store.employee_exists(employee_id)? {
            return Err(ExpError::not_found("employee", employee_id));
        }
        Ok(())
    }

    /// Persist a complaint and return the audit event for it.
    /// Shared by manual filing and the survey hook.
    fn insert(store: &ExpStore, complaint: &ComplaintRecord, now: Timestamp) -> ExpResult<ExpEvent> {
        store.insert_complaint(complaint)?;
        log::info!(
            "{} {} filed: priority={} category={} survey={:?}",
            complaint.kind,
            complaint.complaint_id,
            complaint.priority,
            complaint.category,
            complaint.survey_id,
        );
        Ok(ExpEvent::ComplaintFiled {
            at: now,
            complaint_id: complaint.complaint_id.clone(),
            customer_id: complaint.customer_id.clone(),
            survey_id: complaint.survey_id.clone(),
            kind: complaint.kind,
            priority: complaint.priority,
        })
    }

    pub fn file(
        &self,
        store: &ExpStore,
        input: NewComplaint,
        now: Timestamp,
    ) -> ExpResult<(ComplaintRecord, Vec<ExpEvent>)> {
        let kind = input.kind.ok_or_else(|| ExpError::missing("kind"))?;
        let category = input.category.ok_or_else(|| ExpError::missing("category"))?;
        let description = input
            .description
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| ExpError::missing("description"))?;

        if let Some(customer_id) = &input.customer_id {
            if store.get_customer(customer_id)?.is_none() {
                return Err(ExpError::not_found("customer", customer_id.as_str()));
            }
        }
        if let Some(survey_id) = &input.survey_id {
            if store.get_survey(survey_id)?.is_none() {
                return Err(ExpError::not_found("survey", survey_id.as_str()));
            }
        }
        if let Some(employee_id) = &input.assignee_id {
            Self::check_employee(store, employee_id)?;
        }

        let complaint = ComplaintRecord {
            complaint_id: new_id("cmp"),
            customer_id: input.customer_id,
            survey_id: input.survey_id,
            created_at: now,
            kind,
            priority: input.priority.unwrap_or(Priority::Medium),
            category,
            description,
            action_taken: input.action_taken,
            status: input.status.unwrap_or(ComplaintStatus::Pending),
            assignee_id: input.assignee_id,
            resolved_at: None,
            notify_customer: input.notify_customer,
            notified: false,
        };
        let event = Self::insert(store, &complaint, now)?;
        Ok((complaint, vec![event]))
    }

    /// Mark resolved and stamp the resolution time, whatever the current
    /// status. Resolving twice moves the timestamp forward.
    pub fn resolve(
        &self,
        store: &ExpStore,
        complaint_id: &str,
        now: Timestamp,
    ) -> ExpResult<(ComplaintRecord, Vec<ExpEvent>)> {
        let complaint = Self::load(store, complaint_id)?;
        store.resolve_complaint(complaint_id, now)?;
        log::info!(
            "complaint {complaint_id} resolved (was {})",
            complaint.status
        );

        let events = vec![ExpEvent::ComplaintResolved {
            at: now,
            complaint_id: complaint_id.to_string(),
            previous_status: complaint.status,
        }];
        let complaint = ComplaintRecord {
            status: ComplaintStatus::Resolved,
            resolved_at: Some(now),
            ..complaint
        };
        Ok((complaint, events))
    }

    pub fn set_status(
        &self,
        store: &ExpStore,
        complaint_id: &str,
        status: ComplaintStatus,
        now: Timestamp,
    ) -> ExpResult<(ComplaintRecord, Vec<ExpEvent>)> {
        let complaint = Self::load(store, complaint_id)?;
        store.set_complaint_status(complaint_id, status)?;

        let events = vec![ExpEvent::ComplaintStatusChanged {
            at: now,
            complaint_id: complaint_id.to_string(),
            from: complaint.status,
            to: status,
        }];
        Ok((ComplaintRecord { status, ..complaint }, events))
    }

    pub fn record_action(
        &self,
        store: &ExpStore,
        complaint_id: &str,
        action_taken: &str,
        now: Timestamp,
    ) -> ExpResult<(ComplaintRecord, Vec<ExpEvent>)> {
        let complaint = Self::load(store, complaint_id)?;
        store.set_complaint_action(complaint_id, action_taken)?;

        let events = vec![ExpEvent::ComplaintUpdated {
            at: now,
            complaint_id: complaint_id.to_string(),
            field: "action_taken".into(),
        }];
        let complaint = ComplaintRecord {
            action_taken: Some(action_taken.to_string()),
            ..complaint
        };
        Ok((complaint, events))
    }

    pub fn assign(
        &self,
        store: &ExpStore,
        complaint_id: &str,
        employee_id: &str,
        now: Timestamp,
    ) -> ExpResult<(ComplaintRecord, Vec<ExpEvent>)> {
        let complaint = Self::load(store, complaint_id)?;
        Self::check_employee(store, employee_id)?;
        store.set_complaint_assignee(complaint_id, employee_id)?;

        let events = vec![ExpEvent::ComplaintUpdated {
            at: now,
            complaint_id: complaint_id.to_string(),
            field: "assignee_id".into(),
        }];
        let complaint = ComplaintRecord {
            assignee_id: Some(employee_id.to_string()),
            ..complaint
        };
        Ok((complaint, events))
    }

    /// Called by the messaging integration once the customer was told.
    pub fn mark_notified(
        &self,
        store: &ExpStore,
        complaint_id: &str,
        now: Timestamp,
    ) -> ExpResult<(ComplaintRecord, Vec<ExpEvent>)> {
        let complaint = Self::load(store, complaint_id)?;
        store.mark_complaint_notified(complaint_id)?;

        let events = vec![ExpEvent::CustomerNotified {
            at: now,
            complaint_id: complaint_id.to_string(),
        }];
        Ok((ComplaintRecord { notified: true, ..complaint }, events))
    }
}

impl Default for ComplaintSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Files one high-priority complaint for every survey whose tier is low.
pub struct LowSatisfactionHook {
    placeholder_description: String,
}

impl LowSatisfactionHook {
    pub fn new(placeholder_description: impl Into<String>) -> Self {
        Self {
            placeholder_description: placeholder_description.into(),
        }
    }

    /// The complaint a low-tier survey produces.
    pub fn complaint_for(&self, survey: &SurveyRecord, now: Timestamp) -> ComplaintRecord {
        let description = survey
            .comment_text()
            .unwrap_or(self.placeholder_description.as_str())
            .to_string();
        ComplaintRecord {
            complaint_id: new_id("cmp"),
            customer_id: Some(survey.customer_id.clone()),
            survey_id: Some(survey.survey_id.clone()),
            created_at: now,
            kind: FeedbackKind::Complaint,
            priority: Priority::High,
            category: ComplaintCategory::Other,
            description,
            action_taken: None,
            status: ComplaintStatus::Pending,
            assignee_id: None,
            resolved_at: None,
            notify_customer: true,
            notified: false,
        }
    }
}

impl SurveyHook for LowSatisfactionHook {
    fn name(&self) -> &'static str {
        "low_satisfaction"
    }

    fn after_create(
        &self,
        store: &ExpStore,
        survey: &SurveyRecord,
        now: Timestamp,
    ) -> ExpResult<Vec<ExpEvent>> {
        if survey.tier != SatisfactionTier::Low {
            return Ok(vec![]);
        }
        let complaint = self.complaint_for(survey, now);
        let event = ComplaintSubsystem::insert(store, &complaint, now)?;
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey_subsystem::SurveyRatings;
    use crate::types::Rating;
    use chrono::{TimeZone, Utc};

    fn low_survey(comment: Option<&str>) -> SurveyRecord {
        SurveyRecord {
            survey_id: "svy-1".into(),
            customer_id: "c-1".into(),
            order_id: None,
            surveyed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            ratings: SurveyRatings {
                overall: Rating::new(1).unwrap(),
                food: None,
                drink: Some(Rating::new(1).unwrap()),
                service: None,
                ambience: None,
            },
            would_return: false,
            would_recommend: false,
            comment: comment.map(String::from),
            average_score: 1.0,
            tier: SatisfactionTier::Low,
        }
    }

    #[test]
    fn hook_complaint_is_forced_high_and_pending() {
        let hook = LowSatisfactionHook::new("no comment");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap();
        let c = hook.complaint_for(&low_survey(Some("cold coffee")), now);
        assert_eq!(c.kind, FeedbackKind::Complaint);
        assert_eq!(c.priority, Priority::High);
        assert_eq!(c.status, ComplaintStatus::Pending);
        assert_eq!(c.category, ComplaintCategory::Other);
        assert_eq!(c.description, "cold coffee");
        assert_eq!(c.survey_id.as_deref(), Some("svy-1"));
        assert_eq!(c.customer_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn blank_comment_falls_back_to_placeholder() {
        let hook = LowSatisfactionHook::new("no comment");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap();
        assert_eq!(hook.complaint_for(&low_survey(None), now).description, "no comment");
        assert_eq!(hook.complaint_for(&low_survey(Some("   ")), now).description, "no comment");
    }

    #[test]
    fn status_text_round_trips_through_parse() {
        for status in ComplaintStatus::ALL {
            assert_eq!(status.as_str().parse::<ComplaintStatus>().unwrap(), *status);
        }
        assert!("reopened".parse::<ComplaintStatus>().is_err());
    }
}
