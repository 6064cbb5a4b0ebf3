// Entry boundary - raw form/CLI/JSON input becomes a NewExpense here or not at all

use crate::db::{NewExpense, DATE_FORMAT, DEFAULT_CATEGORY};
use crate::error::{Result, ValidationError};
use crate::money::{Money, MAX_AMOUNT};
use crate::store::ExpenseStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unvalidated expense as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub date: String,
    #[serde(default)]
    pub category: String,
    pub amount: String,
    #[serde(default)]
    pub description: String,
}

impl ExpenseInput {
    pub fn new(date: &str, category: &str, amount: &str, description: &str) -> Self {
        ExpenseInput {
            date: date.to_string(),
            category: category.to_string(),
            amount: amount.to_string(),
            description: description.to_string(),
        }
    }

    pub fn validate(&self) -> std::result::Result<NewExpense, ValidationError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|_| {
            ValidationError::new("date", format!("'{}' is not a date (expected YYYY-MM-DD)", self.date))
        })?;

        let amount = Money::parse(&self.amount)
            .map_err(|e| ValidationError::new("amount", e.to_string()))?;
        if amount.is_negative() {
            return Err(ValidationError::new("amount", "must not be negative"));
        }
        if amount > MAX_AMOUNT {
            return Err(ValidationError::new("amount", format!("must not exceed {}", MAX_AMOUNT)));
        }

        let category = match self.category.trim() {
            "" => DEFAULT_CATEGORY.to_string(),
            other => other.to_string(),
        };

        Ok(NewExpense {
            date,
            category,
            amount,
            description: self.description.clone(),
        })
    }
}

/// Validate and persist one expense. Returns the new record id.
pub fn submit_expense(store: &dyn ExpenseStore, input: &ExpenseInput) -> Result<i64> {
    let expense = input.validate().map_err(|e| {
        tracing::warn!(field = %e.field, "rejected expense: {}", e.message);
        e
    })?;

    store.add(&expense)
}
