use crate::{
    allergen_subsystem::{AllergenPatch, NewAllergen},
    complaint_subsystem::{ComplaintStatus, NewComplaint},
    customer_subsystem::{CustomerRecord, EmployeeRecord, OrderRecord, OrderState, ProductRecord},
    follow_up_subsystem::NewFollowUp,
    preference_subsystem::Preferences,
    survey_subsystem::{NewSurvey, RatingsInput},
    types::EntityId,
};
use serde::{Deserialize, Serialize};

/// Every externally invokable action, as the host sends it.
/// Variants are appended over time, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ExpCommand {
    // ── Host records ──────────────────────────────
    UpsertCustomer { customer: CustomerRecord },
    UpsertProduct { product: ProductRecord },
    UpsertEmployee { employee: EmployeeRecord },
    RecordOrder { order: OrderRecord },
    SetOrderState { order_id: EntityId, state: OrderState },

    // ── Preferences ───────────────────────────────
    CreateProfile {
        customer_id: EntityId,
        #[serde(default)]
        preferences: Preferences,
    },
    UpdatePreferences {
        profile_id: EntityId,
        preferences: Preferences,
    },
    SetProfileAllergens {
        profile_id: EntityId,
        allergen_ids: Vec<EntityId>,
    },
    RecomputeStatistics { customer_id: EntityId },
    RecomputeAllStatistics,
    RegularCustomerAlert { customer_id: EntityId },

    // ── Surveys ───────────────────────────────────
    CreateSurvey { survey: NewSurvey },
    CreateSurveys { surveys: Vec<NewSurvey> },
    UpdateSurveyRatings {
        survey_id: EntityId,
        ratings: RatingsInput,
    },

    // ── Complaints ────────────────────────────────
    FileComplaint { complaint: NewComplaint },
    ResolveComplaint { complaint_id: EntityId },
    SetComplaintStatus {
        complaint_id: EntityId,
        status: ComplaintStatus,
    },
    RecordActionTaken {
        complaint_id: EntityId,
        action_taken: String,
    },
    AssignComplaint {
        complaint_id: EntityId,
        employee_id: EntityId,
    },
    MarkCustomerNotified { complaint_id: EntityId },

    // ── Follow-ups ────────────────────────────────
    LogFollowUp { follow_up: NewFollowUp },

    // ── Allergen catalog ──────────────────────────
    CreateAllergen { allergen: NewAllergen },
    UpdateAllergen {
        allergen_id: EntityId,
        patch: AllergenPatch,
    },
    DeleteAllergen { allergen_id: EntityId },
    LinkProductAllergen {
        product_id: EntityId,
        allergen_id: EntityId,
    },
    UnlinkProductAllergen {
        product_id: EntityId,
        allergen_id: EntityId,
    },

    // ── Queries ───────────────────────────────────
    GetProfile { customer_id: EntityId },
    ListProfiles,
    ListSurveys { customer_id: EntityId },
    ListComplaints,
    ListFollowUps { customer_id: EntityId },
    ListAllergens,
}

impl ExpCommand {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpsertCustomer { .. }        => "upsert_customer",
            Self::UpsertProduct { .. }         => "upsert_product",
            Self::UpsertEmployee { .. }        => "upsert_employee",
            Self::RecordOrder { .. }           => "record_order",
            Self::SetOrderState { .. }         => "set_order_state",
            Self::CreateProfile { .. }         => "create_profile",
            Self::UpdatePreferences { .. }     => "update_preferences",
            Self::SetProfileAllergens { .. }   => "set_profile_allergens",
            Self::RecomputeStatistics { .. }   => "recompute_statistics",
            Self::RecomputeAllStatistics       => "recompute_all_statistics",
            Self::RegularCustomerAlert { .. }  => "regular_customer_alert",
            Self::CreateSurvey { .. }          => "create_survey",
            Self::CreateSurveys { .. }         => "create_surveys",
            Self::UpdateSurveyRatings { .. }   => "update_survey_ratings",
            Self::FileComplaint { .. }         => "file_complaint",
            Self::ResolveComplaint { .. }      => "resolve_complaint",
            Self::SetComplaintStatus { .. }    => "set_complaint_status",
            Self::RecordActionTaken { .. }     => "record_action_taken",
            Self::AssignComplaint { .. }       => "assign_complaint",
            Self::MarkCustomerNotified { .. }  => "mark_customer_notified",
            Self::LogFollowUp { .. }           => "log_follow_up",
            Self::CreateAllergen { .. }        => "create_allergen",
            Self::UpdateAllergen { .. }        => "update_allergen",
            Self::DeleteAllergen { .. }        => "delete_allergen",
            Self::LinkProductAllergen { .. }   => "link_product_allergen",
            Self::UnlinkProductAllergen { .. } => "unlink_product_allergen",
            Self::GetProfile { .. }            => "get_profile",
            Self::ListProfiles                 => "list_profiles",
            Self::ListSurveys { .. }           => "list_surveys",
            Self::ListComplaints               => "list_complaints",
            Self::ListFollowUps { .. }         => "list_follow_ups",
            Self::ListAllergens                => "list_allergens",
        }
    }
}
