use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::period::in_period;
use crate::models::{Category, Period, Transaction};

/// Expense total and transaction count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
    pub count: usize,
}

/// Groups the period's expenses by category.
///
/// Sorted by `total` descending; equal totals keep category declaration
/// order. Categories without expenses in the period are left out.
pub fn category_breakdown(transactions: &[Transaction], period: Period) -> Vec<CategoryTotal> {
    // BTreeMap iterates in declaration order, and the sort below is stable.
    let mut grouped: BTreeMap<Category, (Decimal, usize)> = BTreeMap::new();
    for t in in_period(transactions, period).filter(|t| t.is_expense()) {
        let entry = grouped.entry(t.category).or_insert((Decimal::ZERO, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }

    let mut breakdown: Vec<CategoryTotal> = grouped
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category,
            total,
            count,
        })
        .collect();
    breakdown.sort_by(|a, b| b.total.cmp(&a.total));
    breakdown
}

/// The highest-spending category, or `None` when nothing was spent.
pub fn top_category(breakdown: &[CategoryTotal]) -> Option<Category> {
    breakdown.first().map(|c| c.category)
}

/// Spent amount for `category`, zero when it has no entry.
pub fn spent_in(breakdown: &[CategoryTotal], category: Category) -> Decimal {
    breakdown
        .iter()
        .find(|c| c.category == category)
        .map(|c| c.total)
        .unwrap_or(Decimal::ZERO)
}
