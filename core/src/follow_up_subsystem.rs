//! Staff follow-up actions: an append-only audit log.
//! There is no update or delete path.

use crate::{
    error::{ExpError, ExpResult},
    event::ExpEvent,
    store::ExpStore,
    types::{new_id, text_enum, EntityId, Timestamp},
};
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum FollowUpAction {
        Call         => "call",
        Email        => "email",
        Messaging    => "messaging",
        InPerson     => "in_person",
        Compensation => "compensation",
        Other        => "other",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowUpRecord {
    pub follow_up_id: EntityId,
    pub customer_id: EntityId,
    pub created_at: Timestamp,
    pub action: FollowUpAction,
    pub description: String,
    pub employee_id: EntityId,
    pub complaint_id: Option<EntityId>,
    pub survey_id: Option<EntityId>,
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFollowUp {
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    #[serde(default)]
    pub at: Option<Timestamp>,
    #[serde(default)]
    pub action: Option<FollowUpAction>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub employee_id: Option<EntityId>,
    #[serde(default)]
    pub complaint_id: Option<EntityId>,
    #[serde(default)]
    pub survey_id: Option<EntityId>,
    #[serde(default)]
    pub outcome: Option<String>,
}

fn present(field: &'static str, value: Option<String>) -> ExpResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ExpError::missing(field))
}

pub struct FollowUpSubsystem;

impl FollowUpSubsystem {
    pub fn new() -> Self {
        Self
    }

    pub fn log(
        &self,
        store: &ExpStore,
        input: NewFollowUp,
        now: Timestamp,
    ) -> ExpResult<(FollowUpRecord, Vec<ExpEvent>)> {
        let customer_id = present("customer_id", input.customer_id)?;
        let action = input.action.ok_or_else(|| ExpError::missing("action"))?;
        let description = present("description", input.description)?;
        let employee_id = present("employee_id", input.employee_id)?;

        if store.get_customer(&customer_id)?.is_none() {
            return Err(ExpError::not_found("customer", customer_id));
        }
        if !store.employee_exists(&employee_id)? {
            return Err(ExpError::not_found("employee", employee_id));
        }
        if let Some(complaint_id) = &input.complaint_id {
            if store.get_complaint(complaint_id)?.is_none() {
                return Err(ExpError::not_found("complaint", complaint_id.as_str()));
            }
        }
        if let Some(survey_id) = &input.survey_id {
            if store.get_survey(survey_id)?.is_none() {
                return Err(ExpError::not_found("survey", survey_id.as_str()));
            }
        }

        let record = FollowUpRecord {
            follow_up_id: new_id("fup"),
            customer_id,
            created_at: input.at.unwrap_or(now),
            action,
            description,
            employee_id,
            complaint_id: input.complaint_id,
            survey_id: input.survey_id,
            outcome: input.outcome,
        };
        store.insert_follow_up(&record)?;
        log::info!(
            "follow-up {} ({}) logged for customer {} by {}",
            record.follow_up_id,
            record.action,
            record.customer_id,
            record.employee_id
        );

        let events = vec![ExpEvent::FollowUpLogged {
            at: now,
            follow_up_id: record.follow_up_id.clone(),
            customer_id: record.customer_id.clone(),
            employee_id: record.employee_id.clone(),
        }];
        Ok((record, events))
    }
}

impl Default for FollowUpSubsystem {
    fn default() -> Self {
        Self::new()
    }
}
