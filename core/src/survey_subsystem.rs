//! Satisfaction surveys.
//!
//! Average score and tier are derived from the supplied ratings at write
//! time and stored alongside them. The low-satisfaction follow-through lives
//! in the complaint subsystem as a SurveyHook; this module never creates
//! complaints itself.

use crate::{
    config::TierThresholds,
    error::{ExpError, ExpResult},
    event::ExpEvent,
    store::ExpStore,
    types::{new_id, text_enum, EntityId, Rating, Timestamp},
};
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum SatisfactionTier {
        Low    => "low",
        Medium => "medium",
        High   => "high",
    }
}

impl SatisfactionTier {
    pub fn from_average(average: f64, tiers: &TierThresholds) -> Self {
        if average < tiers.low_below {
            Self::Low
        } else if average < tiers.high_from {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// Validated per-dimension ratings. Overall is always present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SurveyRatings {
    pub overall: Rating,
    pub food: Option<Rating>,
    pub drink: Option<Rating>,
    pub service: Option<Rating>,
    pub ambience: Option<Rating>,
}

impl SurveyRatings {
    /// Every rating that was actually given, overall first.
    pub fn supplied(&self) -> Vec<Rating> {
        std::iter::once(Some(self.overall))
            .chain([self.food, self.drink, self.service, self.ambience])
            .flatten()
            .collect()
    }
}

/// Unvalidated ratings as they arrive from a form or command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingsInput {
    #[serde(default)]
    pub overall: Option<u8>,
    #[serde(default)]
    pub food: Option<u8>,
    #[serde(default)]
    pub drink: Option<u8>,
    #[serde(default)]
    pub service: Option<u8>,
    #[serde(default)]
    pub ambience: Option<u8>,
}

fn rate(field: &'static str, stars: u8) -> ExpResult<Rating> {
    Rating::new(stars).map_err(|_| ExpError::invalid(field, format!("{stars} is outside 1..=5")))
}

impl RatingsInput {
    pub fn validate(&self) -> ExpResult<SurveyRatings> {
        let overall = self.overall.ok_or_else(|| ExpError::missing("overall"))?;
        Ok(SurveyRatings {
            overall: rate("overall", overall)?,
            food: self.food.map(|s| rate("food", s)).transpose()?,
            drink: self.drink.map(|s| rate("drink", s)).transpose()?,
            service: self.service.map(|s| rate("service", s)).transpose()?,
            ambience: self.ambience.map(|s| rate("ambience", s)).transpose()?,
        })
    }
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSurvey {
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    #[serde(default)]
    pub order_id: Option<EntityId>,
    #[serde(default)]
    pub surveyed_at: Option<Timestamp>,
    #[serde(flatten)]
    pub ratings: RatingsInput,
    #[serde(default = "yes")]
    pub would_return: bool,
    #[serde(default = "yes")]
    pub would_recommend: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

impl NewSurvey {
    /// A survey for `customer_id` with only the overall rating filled in.
    pub fn overall(customer_id: &str, overall: u8) -> Self {
        Self {
            customer_id: Some(customer_id.to_string()),
            order_id: None,
            surveyed_at: None,
            ratings: RatingsInput {
                overall: Some(overall),
                ..RatingsInput::default()
            },
            would_return: true,
            would_recommend: true,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveyRecord {
    pub survey_id: EntityId,
    pub customer_id: EntityId,
    pub order_id: Option<EntityId>,
    pub surveyed_at: Timestamp,
    #[serde(flatten)]
    pub ratings: SurveyRatings,
    pub would_return: bool,
    pub would_recommend: bool,
    pub comment: Option<String>,
    pub average_score: f64,
    pub tier: SatisfactionTier,
}

impl SurveyRecord {
    /// The comment, or None when it is absent or blank.
    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// Arithmetic mean of the supplied ratings; 0 when none were supplied.
pub fn average_score(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|r| r.value() as u32).sum();
    sum as f64 / ratings.len() as f64
}

pub struct SurveySubsystem {
    tiers: TierThresholds,
}

impl SurveySubsystem {
    pub fn new(tiers: TierThresholds) -> Self {
        Self { tiers }
    }

    fn derive(&self, ratings: &SurveyRatings) -> (f64, SatisfactionTier) {
        let average = average_score(&ratings.supplied());
        (average, SatisfactionTier::from_average(average, &self.tiers))
    }

    /// Validate and persist one survey. Hooks are run by the engine.
    pub fn create(
        &self,
        store: &ExpStore,
        input: NewSurvey,
        now: Timestamp,
    ) -> ExpResult<(SurveyRecord, Vec<ExpEvent>)> {
        let customer_id = input
            .customer_id
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ExpError::missing("customer_id"))?;
        let ratings = input.ratings.validate()?;

        if store.get_customer(&customer_id)?.is_none() {
            return Err(ExpError::not_found("customer", customer_id));
        }
        if let Some(order_id) = &input.order_id {
            if store.get_order(order_id)?.is_none() {
                return Err(ExpError::not_found("order", order_id.as_str()));
            }
        }

        let (average_score, tier) = self.derive(&ratings);
        let survey = SurveyRecord {
            survey_id: new_id("svy"),
            customer_id,
            order_id: input.order_id,
            surveyed_at: input.surveyed_at.unwrap_or(now),
            ratings,
            would_return: input.would_return,
            would_recommend: input.would_recommend,
            comment: input.comment,
            average_score,
            tier,
        };
        store.insert_survey(&survey)?;
        log::info!(
            "survey {} recorded for customer {}: avg={:.2} tier={}",
            survey.survey_id,
            survey.customer_id,
            survey.average_score,
            survey.tier
        );

        let events = vec![ExpEvent::SurveyRecorded {
            at: now,
            survey_id: survey.survey_id.clone(),
            customer_id: survey.customer_id.clone(),
            average_score,
            tier,
        }];
        Ok((survey, events))
    }

    /// Replace the ratings of an existing survey and re-derive its score.
    pub fn update_ratings(
        &self,
        store: &ExpStore,
        survey_id: &str,
        input: &RatingsInput,
        now: Timestamp,
    ) -> ExpResult<(SurveyRecord, Vec<ExpEvent>)> {
        let survey = store
            .get_survey(survey_id)?
            .ok_or_else(|| ExpError::not_found("survey", survey_id))?;
        let ratings = input.validate()?;
        let (average_score, tier) = self.derive(&ratings);
        store.update_survey_ratings(survey_id, &ratings, average_score, tier)?;
        log::debug!("survey {survey_id} re-rated: avg={average_score:.2} tier={tier}");

        let events = vec![ExpEvent::SurveyRatingsUpdated {
            at: now,
            survey_id: survey_id.to_string(),
            average_score,
            tier,
        }];
        let survey = SurveyRecord {
            ratings,
            average_score,
            tier,
            ..survey
        };
        Ok((survey, events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpConfig;

    fn r(stars: u8) -> Rating {
        Rating::new(stars).unwrap()
    }

    fn tiers() -> TierThresholds {
        ExpConfig::default_test().tiers
    }

    #[test]
    fn average_uses_only_supplied_ratings() {
        let ratings = SurveyRatings {
            overall: r(2),
            food: None,
            drink: Some(r(4)),
            service: None,
            ambience: None,
        };
        let avg = average_score(&ratings.supplied());
        assert_eq!(avg, 3.0);
        assert_eq!(SatisfactionTier::from_average(avg, &tiers()), SatisfactionTier::Medium);
    }

    #[test]
    fn empty_ratings_average_to_zero() {
        assert_eq!(average_score(&[]), 0.0);
    }

    #[test]
    fn tier_boundaries() {
        let t = tiers();
        assert_eq!(SatisfactionTier::from_average(2.99, &t), SatisfactionTier::Low);
        assert_eq!(SatisfactionTier::from_average(3.0, &t), SatisfactionTier::Medium);
        assert_eq!(SatisfactionTier::from_average(3.99, &t), SatisfactionTier::Medium);
        assert_eq!(SatisfactionTier::from_average(4.0, &t), SatisfactionTier::High);
        assert_eq!(SatisfactionTier::from_average(0.0, &t), SatisfactionTier::Low);
    }

    #[test]
    fn missing_overall_is_a_validation_failure() {
        let input = RatingsInput {
            food: Some(4),
            ..RatingsInput::default()
        };
        match input.validate() {
            Err(ExpError::Validation { field, .. }) => assert_eq!(field, "overall"),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_dimension_names_the_field() {
        let input = RatingsInput {
            overall: Some(3),
            service: Some(7),
            ..RatingsInput::default()
        };
        match input.validate() {
            Err(ExpError::Validation { field, .. }) => assert_eq!(field, "service"),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }
}
