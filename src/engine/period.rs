use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::trace;

use crate::models::{Period, Transaction, TransactionType};

/// Income/expense totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodSummary {
    pub income: Decimal,
    pub expenses: Decimal,
    /// Always `income - expenses`; negative when spending exceeds income.
    pub balance: Decimal,
    pub month: u32,
    pub year: i32,
}

/// Picks the target period, defaulting each missing part to the one `now` falls in.
///
/// Returns `None` when the resulting month/year is not a valid period.
pub fn target_period(month: Option<u32>, year: Option<i32>, now: NaiveDateTime) -> Option<Period> {
    Period::new(month.unwrap_or(now.month0()), year.unwrap_or(now.year()))
}

/// Transactions whose `date` lies inside the inclusive period bounds.
pub fn in_period(
    transactions: &[Transaction],
    period: Period,
) -> impl Iterator<Item = &Transaction> + '_ {
    transactions.iter().filter(move |t| period.contains(t.date))
}

/// Sums income and expenses for `period`.
///
/// An empty or non-matching input yields all-zero totals.
pub fn summarize(transactions: &[Transaction], period: Period) -> PeriodSummary {
    let (income, expenses) = in_period(transactions, period).fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(income, expenses), t| match t.kind {
            TransactionType::Income => (income + t.amount, expenses),
            TransactionType::Expense => (income, expenses + t.amount),
        },
    );
    trace!(%period, %income, %expenses, "summarized period");

    PeriodSummary {
        income,
        expenses,
        balance: income - expenses,
        month: period.month(),
        year: period.year(),
    }
}
