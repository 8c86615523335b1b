#![allow(clippy::unwrap_used)]

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::breakdown::spent_in;
use super::progress::{utilization, BudgetStatus};
use super::*;
use crate::models::{Budget, Category, Period, Transaction, TransactionType};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    at(y, m, d, 0, 0, 0)
}

fn period(month: u32, year: i32) -> Period {
    Period::new(month, year).unwrap()
}

fn txn(
    id: i64,
    amount: Decimal,
    kind: TransactionType,
    category: Category,
    date: NaiveDateTime,
) -> Transaction {
    let mut t = Transaction::new(
        "alice".into(),
        format!("txn {id}"),
        amount,
        kind,
        category,
        date,
        date,
    );
    t.id = Some(id);
    t
}

fn expense(id: i64, amount: Decimal, category: Category, date: NaiveDateTime) -> Transaction {
    txn(id, amount, TransactionType::Expense, category, date)
}

fn income(id: i64, amount: Decimal, date: NaiveDateTime) -> Transaction {
    txn(id, amount, TransactionType::Income, Category::Other, date)
}

fn budget(id: i64, category: Category, amount: Decimal, month: u32, year: i32) -> Budget {
    let mut b = Budget::new("alice".into(), category, amount, period(month, year));
    b.id = Some(id);
    b
}

fn sample() -> Vec<Transaction> {
    vec![
        income(1, dec!(3000.00), day(2025, 1, 1)),
        expense(2, dec!(5.25), Category::FoodAndDining, day(2025, 1, 10)),
        expense(3, dec!(42.99), Category::Shopping, day(2025, 1, 15)),
        expense(4, dec!(120.00), Category::BillsAndUtilities, day(2025, 1, 20)),
        expense(5, dec!(18.75), Category::FoodAndDining, day(2025, 1, 28)),
        income(6, dec!(250.00), day(2025, 1, 31)),
        expense(7, dec!(87.30), Category::FoodAndDining, day(2025, 2, 5)),
        expense(8, dec!(60.00), Category::Travel, day(2024, 12, 31)),
    ]
}

// ── Period aggregation ────────────────────────────────────────

#[test]
fn test_summarize_partitions_by_type() {
    let summary = summarize(&sample(), period(0, 2025));
    assert_eq!(summary.income, dec!(3250.00));
    assert_eq!(summary.expenses, dec!(186.99));
    assert_eq!(summary.balance, dec!(3063.01));
    assert_eq!(summary.month, 0);
    assert_eq!(summary.year, 2025);
}

#[test]
fn test_summarize_balance_identity() {
    let txns = sample();
    for p in [period(11, 2024), period(0, 2025), period(1, 2025), period(5, 2030)] {
        let s = summarize(&txns, p);
        assert_eq!(s.income - s.expenses, s.balance, "period {p}");
    }
}

#[test]
fn test_summarize_negative_balance() {
    let txns = vec![
        income(1, dec!(10), day(2025, 4, 1)),
        expense(2, dec!(25.50), Category::Other, day(2025, 4, 2)),
    ];
    let s = summarize(&txns, period(3, 2025));
    assert_eq!(s.balance, dec!(-15.50));
}

#[test]
fn test_no_transactions_in_period() {
    let txns = sample();
    let p = period(6, 2025);
    let s = summarize(&txns, p);
    assert_eq!(s.income, Decimal::ZERO);
    assert_eq!(s.expenses, Decimal::ZERO);
    assert_eq!(s.balance, Decimal::ZERO);

    let breakdown = category_breakdown(&txns, p);
    assert!(breakdown.is_empty());
    assert_eq!(top_category(&breakdown), None);
}

#[test]
fn test_empty_snapshot() {
    let s = summarize(&[], period(0, 2025));
    assert_eq!(s.balance, Decimal::ZERO);
    assert!(category_breakdown(&[], period(0, 2025)).is_empty());
}

#[test]
fn test_december_last_second_included() {
    let txns = vec![
        expense(1, dec!(10), Category::Other, at(2025, 12, 31, 23, 59, 59)),
        expense(2, dec!(99), Category::Other, at(2026, 1, 1, 0, 0, 0)),
        expense(3, dec!(1), Category::Other, at(2025, 12, 1, 0, 0, 0)),
        expense(4, dec!(7), Category::Other, at(2025, 11, 30, 23, 59, 59)),
    ];
    let s = summarize(&txns, period(11, 2025));
    assert_eq!(s.expenses, dec!(11));

    let jan = summarize(&txns, period(0, 2026));
    assert_eq!(jan.expenses, dec!(99));
}

#[test]
fn test_leap_day_included_in_february() {
    let txns = vec![expense(1, dec!(3), Category::Other, at(2024, 2, 29, 18, 0, 0))];
    assert_eq!(summarize(&txns, period(1, 2024)).expenses, dec!(3));
    assert_eq!(summarize(&txns, period(2, 2024)).expenses, Decimal::ZERO);
}

#[test]
fn test_exact_decimal_accumulation() {
    let txns: Vec<Transaction> = (0..1000)
        .map(|i| expense(i, dec!(0.10), Category::Other, day(2025, 3, 1)))
        .collect();
    assert_eq!(summarize(&txns, period(2, 2025)).expenses, dec!(100.00));
}

#[test]
fn test_summarize_is_idempotent() {
    let txns = sample();
    let before = txns.clone();
    let a = summarize(&txns, period(0, 2025));
    let b = summarize(&txns, period(0, 2025));
    assert_eq!(a, b);
    assert_eq!(
        category_breakdown(&txns, period(0, 2025)),
        category_breakdown(&txns, period(0, 2025))
    );
    assert_eq!(txns, before);
}

#[test]
fn test_target_period_defaults() {
    let now = at(2025, 8, 14, 10, 0, 0);
    assert_eq!(target_period(None, None, now), Some(period(7, 2025)));
    assert_eq!(target_period(Some(0), None, now), Some(period(0, 2025)));
    assert_eq!(target_period(None, Some(2024), now), Some(period(7, 2024)));
    assert_eq!(target_period(Some(12), Some(2024), now), None);
}

// ── Category breakdown ────────────────────────────────────────

#[test]
fn test_breakdown_sums_same_category() {
    let txns = vec![
        expense(1, dec!(100), Category::FoodAndDining, day(2025, 1, 5)),
        expense(2, dec!(50), Category::FoodAndDining, day(2025, 1, 10)),
    ];
    let breakdown = category_breakdown(&txns, period(0, 2025));
    assert_eq!(
        breakdown,
        vec![CategoryTotal {
            category: Category::FoodAndDining,
            total: dec!(150),
            count: 2,
        }]
    );
}

#[test]
fn test_breakdown_sorted_by_total_desc() {
    let breakdown = category_breakdown(&sample(), period(0, 2025));
    let cats: Vec<Category> = breakdown.iter().map(|c| c.category).collect();
    assert_eq!(
        cats,
        vec![
            Category::BillsAndUtilities,
            Category::Shopping,
            Category::FoodAndDining
        ]
    );
    assert_eq!(breakdown[2].total, dec!(24.00));
    assert_eq!(breakdown[2].count, 2);
    assert_eq!(top_category(&breakdown), Some(Category::BillsAndUtilities));
}

#[test]
fn test_breakdown_ignores_income() {
    let txns = vec![
        income(1, dec!(500), day(2025, 1, 3)),
        expense(2, dec!(5), Category::Travel, day(2025, 1, 4)),
    ];
    let breakdown = category_breakdown(&txns, period(0, 2025));
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[0].category, Category::Travel);
}

#[test]
fn test_breakdown_tie_uses_declaration_order() {
    // Inserted in reverse declaration order.
    let txns = vec![
        expense(1, dec!(100), Category::Other, day(2025, 5, 1)),
        expense(2, dec!(60), Category::Travel, day(2025, 5, 2)),
        expense(3, dec!(40), Category::Travel, day(2025, 5, 3)),
        expense(4, dec!(100), Category::Transportation, day(2025, 5, 4)),
    ];
    let breakdown = category_breakdown(&txns, period(4, 2025));
    let cats: Vec<Category> = breakdown.iter().map(|c| c.category).collect();
    assert_eq!(
        cats,
        vec![Category::Transportation, Category::Travel, Category::Other]
    );
    assert_eq!(top_category(&breakdown), Some(Category::Transportation));
}

#[test]
fn test_breakdown_is_deterministic_across_input_order() {
    let mut txns = sample();
    let forward = category_breakdown(&txns, period(0, 2025));
    txns.reverse();
    let backward = category_breakdown(&txns, period(0, 2025));
    assert_eq!(forward, backward);
}

#[test]
fn test_breakdown_sums_to_expenses() {
    let txns = sample();
    for p in [period(11, 2024), period(0, 2025), period(1, 2025)] {
        let total: Decimal = category_breakdown(&txns, p).iter().map(|c| c.total).sum();
        assert_eq!(total, summarize(&txns, p).expenses);
    }
}

#[test]
fn test_spent_in_missing_category_is_zero() {
    let breakdown = category_breakdown(&sample(), period(0, 2025));
    assert_eq!(spent_in(&breakdown, Category::Healthcare), Decimal::ZERO);
    assert_eq!(spent_in(&breakdown, Category::Shopping), dec!(42.99));
}

// ── Budget progress ───────────────────────────────────────────

#[test]
fn test_overspent_budget_is_over() {
    let txns = vec![
        expense(1, dec!(100), Category::FoodAndDining, day(2025, 1, 5)),
        expense(2, dec!(50), Category::FoodAndDining, day(2025, 1, 10)),
    ];
    let p = period(0, 2025);
    let budgets = vec![budget(1, Category::FoodAndDining, dec!(100), 0, 2025)];
    let progress = budget_progress(&budgets, &category_breakdown(&txns, p), p);

    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].spent, dec!(150));
    assert_eq!(progress[0].percentage, dec!(150));
    assert_eq!(progress[0].remaining, dec!(-50));
    assert_eq!(progress[0].status, BudgetStatus::Over);
}

#[test]
fn test_zero_budget_is_zero_percent() {
    let p = period(0, 2025);
    let txns = vec![expense(1, dec!(20), Category::Shopping, day(2025, 1, 2))];
    let budgets = vec![budget(1, Category::Shopping, Decimal::ZERO, 0, 2025)];
    let progress = budget_progress(&budgets, &category_breakdown(&txns, p), p);

    assert_eq!(progress[0].percentage, Decimal::ZERO);
    assert_eq!(progress[0].remaining, dec!(-20));
    assert_eq!(progress[0].status, BudgetStatus::Ok);
    assert_eq!(utilization(dec!(5), Decimal::ZERO), Decimal::ZERO);
}

#[test]
fn test_budget_without_spending() {
    let p = period(0, 2025);
    let budgets = vec![budget(1, Category::Healthcare, dec!(80), 0, 2025)];
    let progress = budget_progress(&budgets, &[], p);
    assert_eq!(progress[0].spent, Decimal::ZERO);
    assert_eq!(progress[0].remaining, dec!(80));
    assert_eq!(progress[0].percentage, Decimal::ZERO);
}

#[test]
fn test_budget_progress_sorted_by_percentage() {
    let p = period(0, 2025);
    let txns = sample();
    let budgets = vec![
        budget(1, Category::FoodAndDining, dec!(100), 0, 2025),
        budget(2, Category::BillsAndUtilities, dec!(100), 0, 2025),
        budget(3, Category::Shopping, dec!(50), 0, 2025),
    ];
    let progress = budget_progress(&budgets, &category_breakdown(&txns, p), p);
    let cats: Vec<Category> = progress.iter().map(|b| b.category).collect();
    assert_eq!(
        cats,
        vec![
            Category::BillsAndUtilities,
            Category::Shopping,
            Category::FoodAndDining
        ]
    );
    assert_eq!(progress[0].percentage, dec!(120));
    assert_eq!(progress[1].status, BudgetStatus::Warning);
    assert_eq!(progress[2].status, BudgetStatus::Ok);
}

#[test]
fn test_budget_progress_tie_uses_declaration_order() {
    let p = period(0, 2025);
    let budgets = vec![
        budget(1, Category::Other, dec!(10), 0, 2025),
        budget(2, Category::Education, dec!(10), 0, 2025),
        budget(3, Category::Transportation, dec!(10), 0, 2025),
    ];
    let first = budget_progress(&budgets, &[], p);
    let cats: Vec<Category> = first.iter().map(|b| b.category).collect();
    assert_eq!(
        cats,
        vec![Category::Transportation, Category::Education, Category::Other]
    );

    let mut reversed = budgets.clone();
    reversed.reverse();
    assert_eq!(budget_progress(&reversed, &[], p), first);
}

#[test]
fn test_budget_progress_skips_other_periods() {
    let p = period(0, 2025);
    let budgets = vec![
        budget(1, Category::Travel, dec!(10), 0, 2025),
        budget(2, Category::Travel, dec!(10), 1, 2025),
        budget(3, Category::Travel, dec!(10), 0, 2026),
    ];
    let progress = budget_progress(&budgets, &[], p);
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].budget_id, Some(1));
}

#[test]
fn test_status_thresholds() {
    assert_eq!(BudgetStatus::classify(dec!(0)), BudgetStatus::Ok);
    assert_eq!(BudgetStatus::classify(dec!(80)), BudgetStatus::Ok);
    assert_eq!(BudgetStatus::classify(dec!(80.01)), BudgetStatus::Warning);
    assert_eq!(BudgetStatus::classify(dec!(100)), BudgetStatus::Warning);
    assert_eq!(BudgetStatus::classify(dec!(100.0001)), BudgetStatus::Over);
    assert_eq!(BudgetStatus::Over.to_string(), "over");
}

#[test]
fn test_alerts_distinguish_no_budgets() {
    assert_eq!(budget_alerts(&[]), BudgetAlerts::NoBudgets);

    let p = period(0, 2025);
    let calm = budget_progress(&[budget(1, Category::Travel, dec!(100), 0, 2025)], &[], p);
    assert_eq!(budget_alerts(&calm), BudgetAlerts::AllWithinBudget);
}

#[test]
fn test_alerts_list_flagged_budgets() {
    let p = period(0, 2025);
    let txns = sample();
    let budgets = vec![
        budget(1, Category::FoodAndDining, dec!(100), 0, 2025),
        budget(2, Category::BillsAndUtilities, dec!(100), 0, 2025),
        budget(3, Category::Shopping, dec!(50), 0, 2025),
    ];
    let progress = budget_progress(&budgets, &category_breakdown(&txns, p), p);
    match budget_alerts(&progress) {
        BudgetAlerts::Attention(flagged) => {
            let cats: Vec<Category> = flagged.iter().map(|b| b.category).collect();
            assert_eq!(cats, vec![Category::BillsAndUtilities, Category::Shopping]);
        }
        other => panic!("expected attention, got {other:?}"),
    }
}

#[test]
fn test_alerts_serialize_with_kind_tag() {
    let json = serde_json::to_value(BudgetAlerts::NoBudgets).unwrap();
    assert_eq!(json["kind"], "no_budgets");
}

// ── Recent view and pagination ────────────────────────────────

#[test]
fn test_recent_orders_newest_first() {
    let txns = sample();
    let view = recent(&txns, 3);
    let ids: Vec<Option<i64>> = view.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![Some(7), Some(6), Some(5)]);
}

#[test]
fn test_recent_ties_broken_by_id() {
    let d = day(2025, 6, 1);
    let txns = vec![
        expense(2, dec!(1), Category::Other, d),
        expense(9, dec!(1), Category::Other, d),
        expense(5, dec!(1), Category::Other, d),
    ];
    let ids: Vec<Option<i64>> = recent(&txns, 10).iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![Some(9), Some(5), Some(2)]);
}

#[test]
fn test_recent_is_restartable() {
    let txns = sample();
    let view = recent(&txns, 5);
    let first: Vec<_> = view.iter().collect();
    let second: Vec<_> = (&view).into_iter().collect();
    assert_eq!(first, second);
    assert_eq!(view.to_vec().len(), 5);
}

#[test]
fn test_recent_limit_larger_than_snapshot() {
    let txns = sample();
    assert_eq!(recent(&txns, 100).iter().count(), txns.len());
    assert_eq!(recent(&[], 5).iter().count(), 0);
    assert_eq!(recent(&txns, 0).iter().count(), 0);
}

#[test]
fn test_paginate_metadata() {
    let items: Vec<u32> = (1..=23).collect();
    let page = paginate(&items, 1, 10);
    assert_eq!(page.items, (1..=10).collect::<Vec<_>>());
    assert_eq!(page.total, 23);
    assert_eq!(page.page_count, 3);

    let last = paginate(&items, 3, 10);
    assert_eq!(last.items, vec![21, 22, 23]);
}

#[test]
fn test_paginate_past_end_is_empty() {
    let items: Vec<u32> = (1..=5).collect();
    let page = paginate(&items, 4, 2);
    assert!(page.items.is_empty());
    assert_eq!(page.total, 5);
    assert_eq!(page.page_count, 3);
}

#[test]
fn test_paginate_empty_listing() {
    let page = paginate::<u32>(&[], 1, 50);
    assert!(page.items.is_empty());
    assert_eq!(page.page_count, 0);
}

#[test]
fn test_paginate_exact_multiple() {
    let items: Vec<u32> = (1..=20).collect();
    assert_eq!(paginate(&items, 2, 10).page_count, 2);
}

// ── Insights ──────────────────────────────────────────────────

#[test]
fn test_savings_rate() {
    let s = summarize(&sample(), period(0, 2025));
    // (3250 - 186.99) / 3250 * 100
    assert_eq!(savings_rate(&s).round_dp(4), dec!(94.2465));

    let none = summarize(&[], period(0, 2025));
    assert_eq!(savings_rate(&none), Decimal::ZERO);
}

#[test]
fn test_average_daily_past_period_uses_full_month() {
    let p = period(0, 2025);
    let txns = vec![expense(1, dec!(310), Category::Other, day(2025, 1, 3))];
    let s = summarize(&txns, p);
    // Viewed from a later month: divide by all 31 days, not today's date.
    assert_eq!(average_daily_spending(&s, p, at(2025, 3, 2, 9, 0, 0)), dec!(10));
}

#[test]
fn test_average_daily_current_period_uses_days_elapsed() {
    let p = period(0, 2025);
    let txns = vec![expense(1, dec!(100), Category::Other, day(2025, 1, 3))];
    let s = summarize(&txns, p);
    assert_eq!(average_daily_spending(&s, p, at(2025, 1, 4, 12, 0, 0)), dec!(25));
}

#[test]
fn test_average_daily_without_expenses() {
    let p = period(0, 2025);
    let s = summarize(&[], p);
    assert_eq!(average_daily_spending(&s, p, at(2025, 1, 4, 0, 0, 0)), Decimal::ZERO);
    // Future period: no day has started yet.
    let future = period(5, 2030);
    let s = summarize(&[], future);
    assert_eq!(average_daily_spending(&s, future, at(2025, 1, 4, 0, 0, 0)), Decimal::ZERO);
}

#[test]
fn test_budget_overview() {
    let p = period(0, 2025);
    let s = summarize(&sample(), p);
    let budgets = vec![
        budget(1, Category::FoodAndDining, dec!(100), 0, 2025),
        budget(2, Category::BillsAndUtilities, dec!(50), 0, 2025),
        budget(3, Category::Travel, dec!(999), 1, 2025),
    ];
    let overview = budget_overview(&budgets, &s, p);
    assert_eq!(overview.total_budget, dec!(150));
    assert_eq!(overview.budget_count, 2);
    assert_eq!(overview.remaining, dec!(-36.99));
    assert!(overview.over_budget);
}

#[test]
fn test_monthly_trend() {
    let txns = sample();
    let trend = monthly_expense_trend(&txns, period(1, 2025), 6);
    let months: Vec<(i32, u32)> = trend.iter().map(|m| (m.year, m.month)).collect();
    assert_eq!(months, vec![(2024, 11), (2025, 0), (2025, 1)]);
    assert_eq!(trend[1].total, dec!(186.99));

    let limited = monthly_expense_trend(&txns, period(1, 2025), 2);
    assert_eq!(limited.len(), 2);
    assert_eq!((limited[0].year, limited[0].month), (2025, 0));

    let until_jan = monthly_expense_trend(&txns, period(0, 2025), 6);
    assert_eq!(until_jan.len(), 2);
}
