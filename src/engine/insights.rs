//! Dashboard figures derived from a period summary: savings rate, daily
//! spending, budget overview, and the monthly expense trend.

use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::period::PeriodSummary;
use crate::models::{Budget, Period, Transaction};

/// Share of income not spent, in percent. 0 when there was no income.
pub fn savings_rate(summary: &PeriodSummary) -> Decimal {
    if summary.income > Decimal::ZERO {
        (summary.income - summary.expenses) / summary.income * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Expenses divided by the days of `period` that have started by `now`.
///
/// A past period uses its full length; the current one uses today's
/// day-of-month. Returns 0 when nothing was spent or no day has started.
pub fn average_daily_spending(summary: &PeriodSummary, period: Period, now: NaiveDateTime) -> Decimal {
    let days = period.days_elapsed(now).min(period.days_in_month());
    if summary.expenses.is_zero() || days == 0 {
        return Decimal::ZERO;
    }
    summary.expenses / Decimal::from(days)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetOverview {
    pub total_budget: Decimal,
    /// `total_budget - expenses`; negative is a deficit.
    pub remaining: Decimal,
    pub budget_count: usize,
    pub over_budget: bool,
}

/// Totals all budgets set for `period` against the period's expenses.
pub fn budget_overview(budgets: &[Budget], summary: &PeriodSummary, period: Period) -> BudgetOverview {
    let (total_budget, budget_count) = budgets
        .iter()
        .filter(|b| b.is_for(period))
        .fold((Decimal::ZERO, 0), |(sum, n), b| (sum + b.amount, n + 1));

    BudgetOverview {
        total_budget,
        remaining: total_budget - summary.expenses,
        budget_count,
        over_budget: summary.expenses > total_budget,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub month: u32,
    pub year: i32,
    pub total: Decimal,
}

/// Expense totals per calendar month, oldest first.
///
/// Only months with at least one expense on or before `until` are
/// returned, and only the latest `months` of those.
pub fn monthly_expense_trend(
    transactions: &[Transaction],
    until: Period,
    months: usize,
) -> Vec<MonthTotal> {
    let mut totals: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.is_expense() && t.date <= until.end())
    {
        *totals
            .entry((t.date.year(), t.date.month0()))
            .or_insert(Decimal::ZERO) += t.amount;
    }

    let skip = totals.len().saturating_sub(months);
    totals
        .into_iter()
        .skip(skip)
        .map(|((year, month), total)| MonthTotal { month, year, total })
        .collect()
}
