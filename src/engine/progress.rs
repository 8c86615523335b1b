use rust_decimal::Decimal;
use serde::Serialize;
use tracing::trace;

use super::breakdown::{spent_in, CategoryTotal};
use crate::models::{Budget, Category, Period};

/// Above this utilization a budget is in `warning`.
const WARNING_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);
/// Above this utilization a budget is `over`.
const OVER_THRESHOLD: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Ok,
    Warning,
    Over,
}

impl BudgetStatus {
    /// `over` above 100%, `warning` in (80%, 100%], `ok` otherwise.
    pub fn classify(percentage: Decimal) -> Self {
        if percentage > OVER_THRESHOLD {
            Self::Over
        } else if percentage > WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Over => "over",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A budget paired with what was actually spent against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetProgress {
    pub budget_id: Option<i64>,
    pub category: Category,
    /// The budgeted amount.
    pub amount: Decimal,
    pub spent: Decimal,
    /// `amount - spent`; negative means over budget by its absolute value.
    pub remaining: Decimal,
    /// Utilization in percent. Always 0 for a zero-amount budget.
    pub percentage: Decimal,
    pub status: BudgetStatus,
}

impl BudgetProgress {
    fn new(budget: &Budget, spent: Decimal) -> Self {
        let percentage = utilization(spent, budget.amount);
        Self {
            budget_id: budget.id,
            category: budget.category,
            amount: budget.amount,
            spent,
            remaining: budget.amount - spent,
            percentage,
            status: BudgetStatus::classify(percentage),
        }
    }
}

/// `spent / amount * 100`, or 0 when nothing was budgeted.
pub fn utilization(spent: Decimal, amount: Decimal) -> Decimal {
    if amount > Decimal::ZERO {
        spent / amount * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Utilization of every budget set for `period`.
///
/// `breakdown` must be the category breakdown of the same period. Highest
/// utilization comes first; ties fall back to category declaration order.
pub fn budget_progress(
    budgets: &[Budget],
    breakdown: &[CategoryTotal],
    period: Period,
) -> Vec<BudgetProgress> {
    let mut progress: Vec<BudgetProgress> = budgets
        .iter()
        .filter(|b| b.is_for(period))
        .map(|b| BudgetProgress::new(b, spent_in(breakdown, b.category)))
        .collect();

    progress.sort_by(|a, b| {
        b.percentage
            .cmp(&a.percentage)
            .then(a.category.cmp(&b.category))
            .then(a.budget_id.cmp(&b.budget_id))
    });
    trace!(%period, budgets = progress.len(), "computed budget progress");
    progress
}

/// What threshold-based alerting should report for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "budgets", rename_all = "snake_case")]
pub enum BudgetAlerts {
    /// No budgets are configured for the period.
    NoBudgets,
    /// Budgets exist and every one is `ok`.
    AllWithinBudget,
    /// The `warning` and `over` budgets, in progress order.
    Attention(Vec<BudgetProgress>),
}

pub fn budget_alerts(progress: &[BudgetProgress]) -> BudgetAlerts {
    if progress.is_empty() {
        return BudgetAlerts::NoBudgets;
    }
    let flagged: Vec<BudgetProgress> = progress
        .iter()
        .filter(|p| p.status != BudgetStatus::Ok)
        .cloned()
        .collect();
    if flagged.is_empty() {
        BudgetAlerts::AllWithinBudget
    } else {
        BudgetAlerts::Attention(flagged)
    }
}
