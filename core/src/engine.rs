//! The experience engine: the single facade the host platform calls.
//!
//! RULES:
//!   - Every mutating operation runs inside one store transaction and
//!     appends its audit events in that same transaction.
//!   - Derived fields are recomputed here, on write. Nothing recomputes
//!     lazily on read.
//!   - Survey hooks run in registration order, inside the survey's
//!     transaction. A failing hook rolls back the survey.
//!   - Subsystems never call each other; the engine sequences them.

use crate::{
    allergen_subsystem::{AllergenPatch, AllergenRecord, AllergenSubsystem, NewAllergen},
    clock::ExpClock,
    command::ExpCommand,
    complaint_subsystem::{ComplaintRecord, ComplaintStatus, ComplaintSubsystem, LowSatisfactionHook, NewComplaint},
    config::ExpConfig,
    customer_subsystem::{CustomerRecord, EmployeeRecord, OrderRecord, OrderState, ProductRecord},
    error::{ExpError, ExpResult},
    event::{EventLogEntry, ExpEvent},
    follow_up_subsystem::{FollowUpRecord, FollowUpSubsystem, NewFollowUp},
    preference_subsystem::{PreferenceSubsystem, Preferences, ProfileRecord, RegularCustomerAlert},
    store::ExpStore,
    subsystem::SurveyHook,
    survey_subsystem::{NewSurvey, RatingsInput, SurveyRecord, SurveySubsystem},
    types::{EntityId, Timestamp},
};
use serde::Serialize;

/// A persisted survey and whatever complaint its hooks filed for it.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyOutcome {
    pub survey: SurveyRecord,
    pub complaint: Option<ComplaintRecord>,
}

pub struct ExperienceEngine {
    pub clock: ExpClock,
    config: ExpConfig,
    store: ExpStore,
    preferences: PreferenceSubsystem,
    surveys: SurveySubsystem,
    complaints: ComplaintSubsystem,
    follow_ups: FollowUpSubsystem,
    allergens: AllergenSubsystem,
    hooks: Vec<Box<dyn SurveyHook>>,
}

impl ExperienceEngine {
    /// Bare engine with no hooks registered. Use `build` for the wired one.
    pub fn new(store: ExpStore, config: ExpConfig, clock: ExpClock) -> Self {
        Self {
            preferences: PreferenceSubsystem::new(config.regular_visit_threshold),
            surveys: SurveySubsystem::new(config.tiers.clone()),
            complaints: ComplaintSubsystem::new(),
            follow_ups: FollowUpSubsystem::new(),
            allergens: AllergenSubsystem::new(),
            hooks: Vec::new(),
            clock,
            config,
            store,
        }
    }

    /// Load config from `data_dir`, migrate, seed the allergen catalog and
    /// register the low-satisfaction hook.
    pub fn build(store: ExpStore, data_dir: &str) -> ExpResult<Self> {
        let config = ExpConfig::load(data_dir)?;
        Self::build_with(store, config, ExpClock::System)
    }

    pub fn build_with(store: ExpStore, config: ExpConfig, clock: ExpClock) -> ExpResult<Self> {
        store.migrate()?;
        let mut engine = Self::new(store, config, clock);
        engine.register_hook(Box::new(LowSatisfactionHook::new(
            engine.config.auto_complaint.placeholder_description.clone(),
        )));
        engine.seed_allergens()?;
        Ok(engine)
    }

    /// In-memory engine with the test config.
    pub fn build_test(clock: ExpClock) -> ExpResult<Self> {
        Self::build_with(ExpStore::in_memory()?, ExpConfig::default_test(), clock)
    }

    pub fn register_hook(&mut self, hook: Box<dyn SurveyHook>) {
        log::debug!("survey hook registered: {}", hook.name());
        self.hooks.push(hook);
    }

    pub fn store(&self) -> &ExpStore {
        &self.store
    }

    pub fn config(&self) -> &ExpConfig {
        &self.config
    }

    pub fn clock_mut(&mut self) -> &mut ExpClock {
        &mut self.clock
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn record(store: &ExpStore, source: &str, events: &[ExpEvent]) -> ExpResult<()> {
        for event in events {
            store.append_event(source, event)?;
        }
        Ok(())
    }

    fn seed_allergens(&self) -> ExpResult<()> {
        let now = self.now();
        let added = self.store.in_transaction(|store| {
            let (added, events) = self.allergens.seed(store, &self.config.allergen_seed, now)?;
            Self::record(store, "allergen", &events)?;
            Ok(added)
        })?;
        if added > 0 {
            log::info!("allergen catalog seeded with {added} entries");
        }
        Ok(())
    }

    // ── Host records ──────────────────────────────

    pub fn upsert_customer(&self, customer: &CustomerRecord) -> ExpResult<()> {
        customer.validate()?;
        self.store.upsert_customer(customer)
    }

    pub fn upsert_product(&self, product: &ProductRecord) -> ExpResult<()> {
        product.validate()?;
        self.store.upsert_product(product)
    }

    pub fn upsert_employee(&self, employee: &EmployeeRecord) -> ExpResult<()> {
        employee.validate()?;
        self.store.upsert_employee(employee)
    }

    /// Insert or replace an order and re-derive the statistics of every
    /// customer it touches, including a previous owner if it moved.
    pub fn record_order(&self, order: &OrderRecord) -> ExpResult<Option<ProfileRecord>> {
        order.validate()?;
        let now = self.now();
        self.store.in_transaction(|store| {
            if store.get_customer(&order.customer_id)?.is_none() {
                return Err(ExpError::not_found("customer", order.customer_id.as_str()));
            }
            let previous = store.get_order(&order.order_id)?;
            store.upsert_order(order)?;
            Self::record(
                store,
                "customer",
                &[ExpEvent::OrderRecorded {
                    at: now,
                    order_id: order.order_id.clone(),
                    customer_id: order.customer_id.clone(),
                    state: order.state.to_string(),
                }],
            )?;

            if let Some(prev) = previous.filter(|p| p.customer_id != order.customer_id) {
                self.recompute_in(store, &prev.customer_id, now)?;
            }
            self.recompute_in(store, &order.customer_id, now)
        })
    }

    pub fn set_order_state(&self, order_id: &str, state: OrderState) -> ExpResult<Option<ProfileRecord>> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let order = store
                .get_order(order_id)?
                .ok_or_else(|| ExpError::not_found("order", order_id))?;
            store.set_order_state(order_id, state)?;
            Self::record(
                store,
                "customer",
                &[ExpEvent::OrderRecorded {
                    at: now,
                    order_id: order_id.to_string(),
                    customer_id: order.customer_id.clone(),
                    state: state.to_string(),
                }],
            )?;
            self.recompute_in(store, &order.customer_id, now)
        })
    }

    // ── Preferences ───────────────────────────────

    fn recompute_in(
        &self,
        store: &ExpStore,
        customer_id: &str,
        now: Timestamp,
    ) -> ExpResult<Option<ProfileRecord>> {
        match self.preferences.recompute(store, customer_id, now)? {
            Some((profile, event)) => {
                Self::record(store, "preference", &[event])?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    pub fn create_profile(&self, customer_id: &str, prefs: Preferences) -> ExpResult<ProfileRecord> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let (profile, events) = self.preferences.create_profile(store, customer_id, prefs, now)?;
            Self::record(store, "preference", &events)?;
            Ok(profile)
        })
    }

    pub fn update_preferences(&self, profile_id: &str, prefs: Preferences) -> ExpResult<ProfileRecord> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let (profile, events) = self.preferences.update_preferences(store, profile_id, prefs, now)?;
            Self::record(store, "preference", &events)?;
            Ok(profile)
        })
    }

    pub fn set_profile_allergens(
        &self,
        profile_id: &str,
        allergen_ids: &[EntityId],
    ) -> ExpResult<ProfileRecord> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let (profile, events) = self.preferences.set_allergens(store, profile_id, allergen_ids, now)?;
            Self::record(store, "preference", &events)?;
            Ok(profile)
        })
    }

    /// Explicit recompute. Fails if the customer has no profile.
    pub fn recompute_statistics(&self, customer_id: &str) -> ExpResult<ProfileRecord> {
        let now = self.now();
        self.store
            .in_transaction(|store| self.recompute_in(store, customer_id, now))?
            .ok_or_else(|| ExpError::not_found("preference profile", customer_id))
    }

    pub fn recompute_all_statistics(&self) -> ExpResult<Vec<ProfileRecord>> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let mut profiles = Vec::new();
            for customer_id in store.profile_customer_ids()? {
                if let Some(profile) = self.recompute_in(store, &customer_id, now)? {
                    profiles.push(profile);
                }
            }
            Ok(profiles)
        })
    }

    pub fn regular_customer_alert(&self, customer_id: &str) -> ExpResult<Option<RegularCustomerAlert>> {
        self.preferences.regular_alert(&self.store, customer_id)
    }

    pub fn profile(&self, profile_id: &str) -> ExpResult<Option<ProfileRecord>> {
        self.store.get_profile(profile_id)
    }

    pub fn profile_for_customer(&self, customer_id: &str) -> ExpResult<Option<ProfileRecord>> {
        self.store.profile_for_customer(customer_id)
    }

    pub fn profiles(&self) -> ExpResult<Vec<ProfileRecord>> {
        self.store.all_profiles()
    }

    // ── Surveys ───────────────────────────────────

    fn create_survey_in(&self, store: &ExpStore, input: NewSurvey, now: Timestamp) -> ExpResult<SurveyOutcome> {
        let (survey, events) = self.surveys.create(store, input, now)?;
        Self::record(store, "survey", &events)?;
        for hook in &self.hooks {
            let events = hook.after_create(store, &survey, now)?;
            Self::record(store, hook.name(), &events)?;
        }
        let complaint = store.complaints_for_survey(&survey.survey_id)?.into_iter().next();
        Ok(SurveyOutcome { survey, complaint })
    }

    pub fn create_survey(&self, input: NewSurvey) -> ExpResult<SurveyOutcome> {
        let now = self.now();
        self.store.in_transaction(|store| self.create_survey_in(store, input, now))
    }

    /// All surveys in one transaction; each one is evaluated on its own.
    pub fn create_surveys(&self, inputs: Vec<NewSurvey>) -> ExpResult<Vec<SurveyOutcome>> {
        let now = self.now();
        self.store.in_transaction(|store| {
            inputs
                .into_iter()
                .map(|input| self.create_survey_in(store, input, now))
                .collect()
        })
    }

    /// Re-rate an existing survey. Never files a complaint.
    pub fn update_survey_ratings(&self, survey_id: &str, ratings: &RatingsInput) -> ExpResult<SurveyRecord> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let (survey, events) = self.surveys.update_ratings(store, survey_id, ratings, now)?;
            Self::record(store, "survey", &events)?;
            Ok(survey)
        })
    }

    pub fn survey(&self, survey_id: &str) -> ExpResult<Option<SurveyRecord>> {
        self.store.get_survey(survey_id)
    }

    pub fn surveys_for_customer(&self, customer_id: &str) -> ExpResult<Vec<SurveyRecord>> {
        self.store.surveys_for_customer(customer_id)
    }

    // ── Complaints ────────────────────────────────

    fn complaint_op(
        &self,
        op: impl FnOnce(&ExpStore, Timestamp) -> ExpResult<(ComplaintRecord, Vec<ExpEvent>)>,
    ) -> ExpResult<ComplaintRecord> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let (complaint, events) = op(store, now)?;
            Self::record(store, "complaint", &events)?;
            Ok(complaint)
        })
    }

    pub fn file_complaint(&self, input: NewComplaint) -> ExpResult<ComplaintRecord> {
        self.complaint_op(|store, now| self.complaints.file(store, input, now))
    }

    pub fn resolve_complaint(&self, complaint_id: &str) -> ExpResult<ComplaintRecord> {
        self.complaint_op(|store, now| self.complaints.resolve(store, complaint_id, now))
    }

    pub fn set_complaint_status(&self, complaint_id: &str, status: ComplaintStatus) -> ExpResult<ComplaintRecord> {
        self.complaint_op(|store, now| self.complaints.set_status(store, complaint_id, status, now))
    }

    pub fn record_action_taken(&self, complaint_id: &str, action_taken: &str) -> ExpResult<ComplaintRecord> {
        self.complaint_op(|store, now| self.complaints.record_action(store, complaint_id, action_taken, now))
    }

    pub fn assign_complaint(&self, complaint_id: &str, employee_id: &str) -> ExpResult<ComplaintRecord> {
        self.complaint_op(|store, now| self.complaints.assign(store, complaint_id, employee_id, now))
    }

    pub fn mark_customer_notified(&self, complaint_id: &str) -> ExpResult<ComplaintRecord> {
        self.complaint_op(|store, now| self.complaints.mark_notified(store, complaint_id, now))
    }

    pub fn complaint(&self, complaint_id: &str) -> ExpResult<Option<ComplaintRecord>> {
        self.store.get_complaint(complaint_id)
    }

    pub fn complaints(&self) -> ExpResult<Vec<ComplaintRecord>> {
        self.store.all_complaints()
    }

    pub fn complaints_with_status(&self, status: ComplaintStatus) -> ExpResult<Vec<ComplaintRecord>> {
        self.store.complaints_with_status(status)
    }

    pub fn complaints_for_customer(&self, customer_id: &str) -> ExpResult<Vec<ComplaintRecord>> {
        self.store.complaints_for_customer(customer_id)
    }

    pub fn complaints_for_survey(&self, survey_id: &str) -> ExpResult<Vec<ComplaintRecord>> {
        self.store.complaints_for_survey(survey_id)
    }

    pub fn complaints_awaiting_notification(&self) -> ExpResult<Vec<ComplaintRecord>> {
        self.store.complaints_awaiting_notification()
    }

    // ── Follow-ups ────────────────────────────────

    pub fn log_follow_up(&self, input: NewFollowUp) -> ExpResult<FollowUpRecord> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let (record, events) = self.follow_ups.log(store, input, now)?;
            Self::record(store, "follow_up", &events)?;
            Ok(record)
        })
    }

    pub fn follow_ups_for_customer(&self, customer_id: &str) -> ExpResult<Vec<FollowUpRecord>> {
        self.store.follow_ups_for_customer(customer_id)
    }

    pub fn follow_ups_for_complaint(&self, complaint_id: &str) -> ExpResult<Vec<FollowUpRecord>> {
        self.store.follow_ups_for_complaint(complaint_id)
    }

    // ── Allergen catalog ──────────────────────────

    pub fn create_allergen(&self, input: NewAllergen) -> ExpResult<AllergenRecord> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let (record, events) = self.allergens.create(store, input, now)?;
            Self::record(store, "allergen", &events)?;
            Ok(record)
        })
    }

    pub fn update_allergen(&self, allergen_id: &str, patch: AllergenPatch) -> ExpResult<AllergenRecord> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let (record, events) = self.allergens.update(store, allergen_id, patch, now)?;
            Self::record(store, "allergen", &events)?;
            Ok(record)
        })
    }

    fn allergen_op(&self, op: impl FnOnce(&ExpStore, Timestamp) -> ExpResult<Vec<ExpEvent>>) -> ExpResult<()> {
        let now = self.now();
        self.store.in_transaction(|store| {
            let events = op(store, now)?;
            Self::record(store, "allergen", &events)
        })
    }

    pub fn delete_allergen(&self, allergen_id: &str) -> ExpResult<()> {
        self.allergen_op(|store, now| self.allergens.delete(store, allergen_id, now))
    }

    pub fn link_product_allergen(&self, product_id: &str, allergen_id: &str) -> ExpResult<()> {
        self.allergen_op(|store, now| self.allergens.link_product(store, product_id, allergen_id, now))
    }

    pub fn unlink_product_allergen(&self, product_id: &str, allergen_id: &str) -> ExpResult<()> {
        self.allergen_op(|store, now| self.allergens.unlink_product(store, product_id, allergen_id, now))
    }

    pub fn allergen(&self, allergen_id: &str) -> ExpResult<Option<AllergenRecord>> {
        self.store.get_allergen(allergen_id)
    }

    pub fn allergens(&self) -> ExpResult<Vec<AllergenRecord>> {
        self.store.all_allergens()
    }

    pub fn allergens_for_product(&self, product_id: &str) -> ExpResult<Vec<AllergenRecord>> {
        self.store.allergens_for_product(product_id)
    }

    // ── Audit ─────────────────────────────────────

    pub fn events(&self) -> ExpResult<Vec<EventLogEntry>> {
        self.store.events()
    }

    /// Execute one command and return its result as JSON.
    pub fn apply(&self, command: ExpCommand) -> ExpResult<serde_json::Value> {
        log::debug!("applying command {}", command.name());
        let value = match command {
            ExpCommand::UpsertCustomer { customer } => {
                self.upsert_customer(&customer)?;
                serde_json::to_value(customer)?
            }
            ExpCommand::UpsertProduct { product } => {
                self.upsert_product(&product)?;
                serde_json::to_value(product)?
            }
            ExpCommand::UpsertEmployee { employee } => {
                self.upsert_employee(&employee)?;
                serde_json::to_value(employee)?
            }
            ExpCommand::RecordOrder { order } => serde_json::to_value(self.record_order(&order)?)?,
            ExpCommand::SetOrderState { order_id, state } => {
                serde_json::to_value(self.set_order_state(&order_id, state)?)?
            }
            ExpCommand::CreateProfile { customer_id, preferences } => {
                serde_json::to_value(self.create_profile(&customer_id, preferences)?)?
            }
            ExpCommand::UpdatePreferences { profile_id, preferences } => {
                serde_json::to_value(self.update_preferences(&profile_id, preferences)?)?
            }
            ExpCommand::SetProfileAllergens { profile_id, allergen_ids } => {
                serde_json::to_value(self.set_profile_allergens(&profile_id, &allergen_ids)?)?
            }
            ExpCommand::RecomputeStatistics { customer_id } => {
                serde_json::to_value(self.recompute_statistics(&customer_id)?)?
            }
            ExpCommand::RecomputeAllStatistics => serde_json::to_value(self.recompute_all_statistics()?)?,
            ExpCommand::RegularCustomerAlert { customer_id } => {
                serde_json::to_value(self.regular_customer_alert(&customer_id)?)?
            }
            ExpCommand::CreateSurvey { survey } => serde_json::to_value(self.create_survey(survey)?)?,
            ExpCommand::CreateSurveys { surveys } => serde_json::to_value(self.create_surveys(surveys)?)?,
            ExpCommand::UpdateSurveyRatings { survey_id, ratings } => {
                serde_json::to_value(self.update_survey_ratings(&survey_id, &ratings)?)?
            }
            ExpCommand::FileComplaint { complaint } => serde_json::to_value(self.file_complaint(complaint)?)?,
            ExpCommand::ResolveComplaint { complaint_id } => {
                serde_json::to_value(self.resolve_complaint(&complaint_id)?)?
            }
            ExpCommand::SetComplaintStatus { complaint_id, status } => {
                serde_json::to_value(self.set_complaint_status(&complaint_id, status)?)?
            }
            ExpCommand::RecordActionTaken { complaint_id, action_taken } => {
                serde_json::to_value(self.record_action_taken(&complaint_id, &action_taken)?)?
            }
            ExpCommand::AssignComplaint { complaint_id, employee_id } => {
                serde_json::to_value(self.assign_complaint(&complaint_id, &employee_id)?)?
            }
            ExpCommand::MarkCustomerNotified { complaint_id } => {
                serde_json::to_value(self.mark_customer_notified(&complaint_id)?)?
            }
            ExpCommand::LogFollowUp { follow_up } => serde_json::to_value(self.log_follow_up(follow_up)?)?,
            ExpCommand::CreateAllergen { allergen } => serde_json::to_value(self.create_allergen(allergen)?)?,
            ExpCommand::UpdateAllergen { allergen_id, patch } => {
                serde_json::to_value(self.update_allergen(&allergen_id, patch)?)?
            }
            ExpCommand::DeleteAllergen { allergen_id } => {
                self.delete_allergen(&allergen_id)?;
                serde_json::json!({ "deleted": allergen_id })
            }
            ExpCommand::LinkProductAllergen { product_id, allergen_id } => {
                self.link_product_allergen(&product_id, &allergen_id)?;
                serde_json::to_value(self.allergens_for_product(&product_id)?)?
            }
            ExpCommand::UnlinkProductAllergen { product_id, allergen_id } => {
                self.unlink_product_allergen(&product_id, &allergen_id)?;
                serde_json::to_value(self.allergens_for_product(&product_id)?)?
            }
            ExpCommand::GetProfile { customer_id } => {
                serde_json::to_value(self.profile_for_customer(&customer_id)?)?
            }
            ExpCommand::ListProfiles => serde_json::to_value(self.profiles()?)?,
            ExpCommand::ListSurveys { customer_id } => {
                serde_json::to_value(self.surveys_for_customer(&customer_id)?)?
            }
            ExpCommand::ListComplaints => serde_json::to_value(self.complaints()?)?,
            ExpCommand::ListFollowUps { customer_id } => {
                serde_json::to_value(self.follow_ups_for_customer(&customer_id)?)?
            }
            ExpCommand::ListAllergens => serde_json::to_value(self.allergens()?)?,
        };
        Ok(value)
    }
}
