//! Customer preference profiles and the visit statistics derived from
//! order history.
//!
//! RULE: The statistics block is derived, never written by callers.
//! `recompute` is the only path that updates it and is re-run by the
//! engine whenever a customer's order set changes.

use crate::{
    customer_subsystem::{OrderRecord, ProductCategory},
    error::{ExpError, ExpResult},
    event::ExpEvent,
    store::ExpStore,
    types::{new_id, text_enum, EntityId, Timestamp},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum CoffeeType {
        Espresso   => "espresso",
        WithMilk   => "with_milk",
        Cortado    => "cortado",
        Cappuccino => "cappuccino",
        Americano  => "americano",
        Decaf      => "decaf",
    }
}

text_enum! {
    pub enum Temperature {
        VeryHot => "very_hot",
        Normal  => "normal",
        Warm    => "warm",
        Cold    => "cold",
    }
}

text_enum! {
    pub enum MilkType {
        Whole       => "whole",
        SemiSkimmed => "semi_skimmed",
        Skimmed     => "skimmed",
        Soy         => "soy",
        Almond      => "almond",
        Oat         => "oat",
        LactoseFree => "lactose_free",
    }
}

text_enum! {
    pub enum Sweetener {
        NoSugar    => "none",
        Little     => "little",
        Normal     => "normal",
        Lots       => "lots",
        Substitute => "sweetener",
    }
}

/// Caller-editable taste preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default)]
    pub favorite_drink_id: Option<EntityId>,
    #[serde(default)]
    pub coffee_type: Option<CoffeeType>,
    #[serde(default)]
    pub temperature: Option<Temperature>,
    #[serde(default)]
    pub milk_type: Option<MilkType>,
    #[serde(default)]
    pub sweetener: Option<Sweetener>,
    #[serde(default)]
    pub favorite_dish_id: Option<EntityId>,
    #[serde(default)]
    pub dietary_notes: Option<String>,
}

/// Aggregate figures over a customer's paid orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VisitStatistics {
    pub visit_count: u32,
    pub total_spend: f64,
    pub avg_spend_per_visit: f64,
    pub first_visit: Option<NaiveDate>,
    pub last_visit: Option<NaiveDate>,
    pub is_regular: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileRecord {
    pub profile_id: EntityId,
    pub customer_id: EntityId,
    /// Read through from the customer record.
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(flatten)]
    pub preferences: Preferences,
    pub allergen_ids: Vec<EntityId>,
    #[serde(flatten)]
    pub stats: VisitStatistics,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// What the till shows when a regular customer starts an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegularCustomerAlert {
    pub customer_id: EntityId,
    pub customer_name: String,
    pub visit_count: u32,
    pub last_visit: Option<NaiveDate>,
    pub preferences: Preferences,
    pub allergen_ids: Vec<EntityId>,
}

/// Derive visit statistics from a full order history.
/// Non-paid orders are ignored; the result is a pure function of `orders`.
pub fn compute_statistics(orders: &[OrderRecord], regular_threshold: u32) -> VisitStatistics {
    let paid: Vec<&OrderRecord> = orders.iter().filter(|o| o.state.is_paid()).collect();

    let visit_count = paid.len() as u32;
    let total_spend: f64 = paid.iter().map(|o| o.amount_total).sum();
    let avg_spend_per_visit = if visit_count > 0 {
        total_spend / visit_count as f64
    } else {
        0.0
    };
    let first_visit = paid.iter().map(|o| o.ordered_at.date_naive()).min();
    let last_visit = paid.iter().map(|o| o.ordered_at.date_naive()).max();

    VisitStatistics {
        visit_count,
        total_spend,
        avg_spend_per_visit,
        first_visit,
        last_visit,
        is_regular: is_regular(visit_count, regular_threshold),
    }
}

pub fn is_regular(visit_count: u32, threshold: u32) -> bool {
    visit_count >= threshold
}

pub struct PreferenceSubsystem {
    regular_threshold: u32,
}

impl PreferenceSubsystem {
    pub fn new(regular_threshold: u32) -> Self {
        Self { regular_threshold }
    }

    /// Favorites must point at a product from the matching category.
    fn check_favorites(store: &ExpStore, prefs: &Preferences) -> ExpResult<()> {
        let checks = [
            ("favorite_drink_id", &prefs.favorite_drink_id, ProductCategory::Drink),
            ("favorite_dish_id", &prefs.favorite_dish_id, ProductCategory::Food),
        ];
        for (field, product_id, expected) in checks {
            let Some(product_id) = product_id else {
                continue;
            };
            let product = store
                .get_product(product_id)?
                .ok_or_else(|| ExpError::not_found("product", product_id.as_str()))?;
            if product.category != expected {
                return Err(ExpError::invalid(
                    field,
                    format!(
                        "product '{product_id}' is in category '{}', expected '{expected}'",
                        product.category
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn create_profile(
        &self,
        store: &ExpStore,
        customer_id: &str,
        prefs: Preferences,
        now: Timestamp,
    ) -> ExpResult<(ProfileRecord, Vec<ExpEvent>)> {
        if customer_id.trim().is_empty() {
            return Err(ExpError::missing("customer_id"));
        }
        let customer = store
            .get_customer(customer_id)?
            .ok_or_else(|| ExpError::not_found("customer", customer_id))?;
        if store.profile_for_customer(customer_id)?.is_some() {
            return Err(ExpError::invalid(
                "customer_id",
                format!("customer '{customer_id}' already has a preference profile"),
            ));
        }
        Self::check_favorites(store, &prefs)?;

        let orders = store.orders_for_customer(customer_id)?;
        let stats = compute_statistics(&orders, self.regular_threshold);
        let profile = ProfileRecord {
            profile_id: new_id("pref"),
            customer_id: customer_id.to_string(),
            phone: customer.phone,
            email: customer.email,
            preferences: prefs,
            allergen_ids: Vec::new(),
            stats,
            created_at: now,
            updated_at: now,
        };
        store.insert_profile(&profile)?;
        log::info!(
            "profile {} created for customer {customer_id} ({} visits)",
            profile.profile_id,
            profile.stats.visit_count
        );

        let events = vec![ExpEvent::ProfileCreated {
            at: now,
            profile_id: profile.profile_id.clone(),
            customer_id: profile.customer_id.clone(),
        }];
        Ok((profile, events))
    }

    pub fn update_preferences(
        &self,
        store: &ExpStore,
        profile_id: &str,
        prefs: Preferences,
        now: Timestamp,
    ) -> ExpResult<(ProfileRecord, Vec<ExpEvent>)> {
        if store.get_profile(profile_id)?.is_none() {
            return Err(ExpError::not_found("preference profile", profile_id));
        }
        Self::check_favorites(store, &prefs)?;
        store.update_preferences(profile_id, &prefs, now)?;

        let profile = store
            .get_profile(profile_id)?
            .ok_or_else(|| ExpError::not_found("preference profile", profile_id))?;
        let events = vec![ExpEvent::PreferencesUpdated {
            at: now,
            profile_id: profile_id.to_string(),
        }];
        Ok((profile, events))
    }

    /// Replace the allergen selection of a profile.
    pub fn set_allergens(
        &self,
        store: &ExpStore,
        profile_id: &str,
        allergen_ids: &[EntityId],
        now: Timestamp,
    ) -> ExpResult<(ProfileRecord, Vec<ExpEvent>)> {
        if store.get_profile(profile_id)?.is_none() {
            return Err(ExpError::not_found("preference profile", profile_id));
        }
        for allergen_id in allergen_ids {
            if store.get_allergen(allergen_id)?.is_none() {
                return Err(ExpError::not_found("allergen", allergen_id.as_str()));
            }
        }
        store.set_profile_allergens(profile_id, allergen_ids, now)?;

        let profile = store
            .get_profile(profile_id)?
            .ok_or_else(|| ExpError::not_found("preference profile", profile_id))?;
        let events = vec![ExpEvent::PreferencesUpdated {
            at: now,
            profile_id: profile_id.to_string(),
        }];
        Ok((profile, events))
    }

    /// Re-derive the statistics of one customer's profile from the
    /// current order set. Returns None if the customer has no profile.
    pub fn recompute(
        &self,
        store: &ExpStore,
        customer_id: &str,
        now: Timestamp,
    ) -> ExpResult<Option<(ProfileRecord, ExpEvent)>> {
        let Some(profile) = store.profile_for_customer(customer_id)? else {
            return Ok(None);
        };
        let orders = store.orders_for_customer(customer_id)?;
        let stats = compute_statistics(&orders, self.regular_threshold);
        log::debug!(
            "customer {customer_id}: visits={} spend={:.2} avg={:.2} regular={}",
            stats.visit_count,
            stats.total_spend,
            stats.avg_spend_per_visit,
            stats.is_regular,
        );
        store.update_statistics(&profile.profile_id, &stats, now)?;

        let event = ExpEvent::StatisticsRecomputed {
            at: now,
            customer_id: customer_id.to_string(),
            visit_count: stats.visit_count,
            total_spend: stats.total_spend,
            is_regular: stats.is_regular,
        };
        let profile = ProfileRecord {
            stats,
            updated_at: now,
            ..profile
        };
        Ok(Some((profile, event)))
    }

    pub fn regular_alert(
        &self,
        store: &ExpStore,
        customer_id: &str,
    ) -> ExpResult<Option<RegularCustomerAlert>> {
        let Some(profile) = store.profile_for_customer(customer_id)? else {
            return Ok(None);
        };
        if !profile.stats.is_regular {
            return Ok(None);
        }
        let Some(customer) = store.get_customer(customer_id)? else {
            return Ok(None);
        };
        Ok(Some(RegularCustomerAlert {
            customer_id: profile.customer_id,
            customer_name: customer.name,
            visit_count: profile.stats.visit_count,
            last_visit: profile.stats.last_visit,
            preferences: profile.preferences,
            allergen_ids: profile.allergen_ids,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer_subsystem::OrderState;
    use chrono::{TimeZone, Utc};

    fn order(id: &str, state: OrderState, amount: f64, day: u32) -> OrderRecord {
        OrderRecord {
            order_id: id.into(),
            customer_id: "c-1".into(),
            state,
            amount_total: amount,
            ordered_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn no_paid_orders_yields_zeroed_statistics() {
        let orders = vec![
            order("o1", OrderState::Draft, 12.0, 1),
            order("o2", OrderState::Cancelled, 8.0, 2),
        ];
        let stats = compute_statistics(&orders, 5);
        assert_eq!(stats, VisitStatistics::default());
    }

    #[test]
    fn only_paid_orders_count() {
        let orders = vec![
            order("o1", OrderState::Paid, 40.0, 3),
            order("o2", OrderState::Done, 99.0, 4),
            order("o3", OrderState::Paid, 60.0, 10),
            order("o4", OrderState::Invoiced, 5.0, 1),
            order("o5", OrderState::Paid, 50.0, 7),
        ];
        let stats = compute_statistics(&orders, 5);
        assert_eq!(stats.visit_count, 3);
        assert_eq!(stats.total_spend, 150.0);
        assert_eq!(stats.avg_spend_per_visit, 50.0);
        assert_eq!(stats.first_visit, NaiveDate::from_ymd_opt(2024, 3, 3));
        assert_eq!(stats.last_visit, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert!(!stats.is_regular);
    }

    #[test]
    fn regular_flag_flips_at_threshold() {
        let four: Vec<_> = (1..=4)
            .map(|d| order(&format!("o{d}"), OrderState::Paid, 3.0, d))
            .collect();
        assert!(!compute_statistics(&four, 5).is_regular);

        let mut five = four.clone();
        five.push(order("o5", OrderState::Paid, 3.0, 5));
        assert!(compute_statistics(&five, 5).is_regular);
    }
}
