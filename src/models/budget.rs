use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Category, Period};

/// Monthly spending limit for one category.
///
/// At most one budget exists per `(owner, category, month, year)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Option<i64>,
    pub owner: String,
    pub category: Category,
    pub amount: Decimal,
    /// Zero-based calendar month, 0-11.
    pub month: u32,
    pub year: i32,
}

impl Budget {
    pub fn new(owner: String, category: Category, amount: Decimal, period: Period) -> Self {
        Self {
            id: None,
            owner,
            category,
            amount,
            month: period.month(),
            year: period.year(),
        }
    }

    pub fn is_for(&self, period: Period) -> bool {
        self.month == period.month() && self.year == period.year()
    }
}

/// Field changes for an existing budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetPatch {
    pub category: Option<Category>,
    pub amount: Option<Decimal>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl BudgetPatch {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.amount.is_none() && self.month.is_none() && self.year.is_none()
    }

    pub fn apply(&self, budget: &mut Budget) {
        if let Some(category) = self.category {
            budget.category = category;
        }
        if let Some(amount) = self.amount {
            budget.amount = amount;
        }
        if let Some(month) = self.month {
            budget.month = month;
        }
        if let Some(year) = self.year {
            budget.year = year;
        }
    }
}
