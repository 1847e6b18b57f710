//! Audit events, one per mutating operation.
//!
//! RULE: Events are written in the same transaction as the change they
//! describe. Nothing subscribes to them; they exist for the audit trail.

use crate::{
    complaint_subsystem::{ComplaintStatus, FeedbackKind, Priority},
    survey_subsystem::SatisfactionTier,
    types::{EntityId, Timestamp},
};
use serde::{Deserialize, Serialize};

/// Variants are appended over time, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpEvent {
    // ── Host records ───────────────────────────────
    OrderRecorded {
        at: Timestamp,
        order_id: EntityId,
        customer_id: EntityId,
        state: String,
    },

    // ── Preferences ────────────────────────────────
    ProfileCreated {
        at: Timestamp,
        profile_id: EntityId,
        customer_id: EntityId,
    },
    PreferencesUpdated {
        at: Timestamp,
        profile_id: EntityId,
    },
    StatisticsRecomputed {
        at: Timestamp,
        customer_id: EntityId,
        visit_count: u32,
        total_spend: f64,
        is_regular: bool,
    },

    // ── Surveys ────────────────────────────────────
    SurveyRecorded {
        at: Timestamp,
        survey_id: EntityId,
        customer_id: EntityId,
        average_score: f64,
        tier: SatisfactionTier,
    },
    SurveyRatingsUpdated {
        at: Timestamp,
        survey_id: EntityId,
        average_score: f64,
        tier: SatisfactionTier,
    },

    // ── Complaints ─────────────────────────────────
    ComplaintFiled {
        at: Timestamp,
        complaint_id: EntityId,
        customer_id: Option<EntityId>,
        survey_id: Option<EntityId>,
        kind: FeedbackKind,
        priority: Priority,
    },
    ComplaintStatusChanged {
        at: Timestamp,
        complaint_id: EntityId,
        from: ComplaintStatus,
        to: ComplaintStatus,
    },
    ComplaintResolved {
        at: Timestamp,
        complaint_id: EntityId,
        previous_status: ComplaintStatus,
    },
    ComplaintUpdated {
        at: Timestamp,
        complaint_id: EntityId,
        field: String,
    },
    CustomerNotified {
        at: Timestamp,
        complaint_id: EntityId,
    },

    // ── Follow-ups ─────────────────────────────────
    FollowUpLogged {
        at: Timestamp,
        follow_up_id: EntityId,
        customer_id: EntityId,
        employee_id: EntityId,
    },

    // ── Allergen catalog ───────────────────────────
    AllergenChanged {
        at: Timestamp,
        allergen_id: EntityId,
        change: String,
    },
}

impl ExpEvent {
    /// Stable name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::OrderRecorded { .. }          => "order_recorded",
            Self::ProfileCreated { .. }         => "profile_created",
            Self::PreferencesUpdated { .. }     => "preferences_updated",
            Self::StatisticsRecomputed { .. }   => "statistics_recomputed",
            Self::SurveyRecorded { .. }         => "survey_recorded",
            Self::SurveyRatingsUpdated { .. }   => "survey_ratings_updated",
            Self::ComplaintFiled { .. }         => "complaint_filed",
            Self::ComplaintStatusChanged { .. } => "complaint_status_changed",
            Self::ComplaintResolved { .. }      => "complaint_resolved",
            Self::ComplaintUpdated { .. }       => "complaint_updated",
            Self::CustomerNotified { .. }       => "customer_notified",
            Self::FollowUpLogged { .. }         => "follow_up_logged",
            Self::AllergenChanged { .. }        => "allergen_changed",
        }
    }

    pub fn at(&self) -> Timestamp {
        match self {
            Self::OrderRecorded { at, .. }
            | Self::ProfileCreated { at, .. }
            | Self::PreferencesUpdated { at, .. }
            | Self::StatisticsRecomputed { at, .. }
            | Self::SurveyRecorded { at, .. }
            | Self::SurveyRatingsUpdated { at, .. }
            | Self::ComplaintFiled { at, .. }
            | Self::ComplaintStatusChanged { at, .. }
            | Self::ComplaintResolved { at, .. }
            | Self::ComplaintUpdated { at, .. }
            | Self::CustomerNotified { at, .. }
            | Self::FollowUpLogged { at, .. }
            | Self::AllergenChanged { at, .. } => *at,
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub source: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized ExpEvent
    pub created_at: Timestamp,
}
