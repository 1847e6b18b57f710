//! Post-creation hooks for surveys.
//!
//! RULE: The engine calls after_create() on each registered hook, in
//! registration order, for every survey it persists. Hooks run inside the
//! survey's transaction; an error from any hook rolls back the survey too.

use crate::{
    error::ExpResult,
    event::ExpEvent,
    store::ExpStore,
    survey_subsystem::SurveyRecord,
    types::Timestamp,
};

/// The contract every survey hook must fulfill.
pub trait SurveyHook: Send {
    /// Unique stable name, recorded as the event source.
    fn name(&self) -> &'static str;

    /// Called once per newly created survey.
    ///
    /// - `store`:  the store, already inside the survey's transaction
    /// - `survey`: the survey as persisted, derived fields included
    /// - `now`:    the timestamp of the creating operation
    ///
    /// Returns the audit events for whatever the hook wrote.
    fn after_create(
        &self,
        store: &ExpStore,
        survey: &SurveyRecord,
        now: Timestamp,
    ) -> ExpResult<Vec<ExpEvent>>;
}
