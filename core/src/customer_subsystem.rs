//! Host-platform records the experience module reads: customers,
//! products, staff and point-of-sale orders.
//!
//! These are owned by the surrounding POS/CRM/HR platform. The module keeps
//! only the columns its derivations and validations need.

use crate::{
    error::{ExpError, ExpResult},
    types::{text_enum, EntityId, Timestamp},
};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Lifecycle of a point-of-sale order.
    pub enum OrderState {
        Draft     => "draft",
        Paid      => "paid",
        Done      => "done",
        Invoiced  => "invoiced",
        Cancelled => "cancelled",
    }
}

impl OrderState {
    /// Only orders in exactly the `paid` state count as visits.
    pub fn is_paid(self) -> bool {
        matches!(self, OrderState::Paid)
    }
}

text_enum! {
    /// Product category used to filter favorite selections.
    pub enum ProductCategory {
        Drink => "drink",
        Food  => "food",
        Other => "other",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub product_id: EntityId,
    pub name: String,
    pub category: ProductCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeRecord {
    pub employee_id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub order_id: EntityId,
    pub customer_id: EntityId,
    pub state: OrderState,
    pub amount_total: f64,
    pub ordered_at: Timestamp,
}

pub(crate) fn require_text(field: &'static str, value: &str) -> ExpResult<()> {
    if value.trim().is_empty() {
        return Err(ExpError::missing(field));
    }
    Ok(())
}

impl CustomerRecord {
    pub fn validate(&self) -> ExpResult<()> {
        require_text("customer_id", &self.customer_id)?;
        require_text("name", &self.name)
    }
}

impl ProductRecord {
    pub fn validate(&self) -> ExpResult<()> {
        require_text("product_id", &self.product_id)?;
        require_text("name", &self.name)
    }
}

impl EmployeeRecord {
    pub fn validate(&self) -> ExpResult<()> {
        require_text("employee_id", &self.employee_id)?;
        require_text("name", &self.name)
    }
}

impl OrderRecord {
    pub fn validate(&self) -> ExpResult<()> {
        require_text("order_id", &self.order_id)?;
        require_text("customer_id", &self.customer_id)?;
        if !self.amount_total.is_finite() {
            return Err(ExpError::invalid(
                "amount_total",
                format!("{} is not a finite amount", self.amount_total),
            ));
        }
        Ok(())
    }
}
