//! Boundary validation: raw user input in, typed values out.
//!
//! Every problem in a form is reported at once, one message per field.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::{
    Budget, BudgetPatch, Category, Period, Transaction, TransactionPatch, TransactionType,
};

type Field<T> = std::result::Result<T, String>;

const DESCRIPTION_MAX: usize = 200;
const MIN_BUDGET_YEAR: i32 = 2020;
const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 500;
/// Smallest accepted transaction amount, one cent.
const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
/// Largest accepted amount, 10^12. Keeps period sums and percentages far
/// from the range limit of `Decimal`.
const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// A transaction as typed by the user. On edit, `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TransactionForm {
    pub description: Option<String>,
    pub amount: Option<String>,
    pub kind: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
}

/// A budget as typed by the user. On edit, `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BudgetForm {
    pub category: Option<String>,
    pub amount: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
}

/// Month/year scope of a read. Semantics of a missing part depend on the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PeriodQuery {
    pub month: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub period: PeriodQuery,
    pub category: Option<String>,
    pub kind: Option<String>,
}

/// A validated [`ListQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListParams {
    pub page: usize,
    pub limit: usize,
    pub period: Option<Period>,
    pub category: Option<Category>,
    pub kind: Option<TransactionType>,
}

// ── Forms ─────────────────────────────────────────────────────

pub(crate) fn new_transaction(
    form: &TransactionForm,
    owner: &str,
    now: NaiveDateTime,
) -> Result<Transaction> {
    let description = description(form.description.as_deref());
    let amount = required(form.amount.as_deref(), "Amount").and_then(transaction_amount);
    let kind = transaction_type(form.kind.as_deref());
    let category = category(form.category.as_deref());
    let date = form.date.as_deref().map_or(Ok(now), date);

    match (description, amount, kind, category, date) {
        (Ok(description), Ok(amount), Ok(kind), Ok(category), Ok(date)) => Ok(Transaction::new(
            owner.to_string(),
            description,
            amount,
            kind,
            category,
            date,
            now,
        )),
        (d, a, k, c, dt) => Err(collect([d.err(), a.err(), k.err(), c.err(), dt.err()])),
    }
}

pub(crate) fn transaction_patch(form: &TransactionForm) -> Result<TransactionPatch> {
    let description = form
        .description
        .as_deref()
        .map(|raw| description(Some(raw)))
        .transpose();
    let amount = form.amount.as_deref().map(transaction_amount).transpose();
    let kind = form
        .kind
        .as_deref()
        .map(|raw| transaction_type(Some(raw)))
        .transpose();
    let category = form
        .category
        .as_deref()
        .map(|raw| category(Some(raw)))
        .transpose();
    let date = form.date.as_deref().map(date).transpose();

    let patch = match (description, amount, kind, category, date) {
        (Ok(description), Ok(amount), Ok(kind), Ok(category), Ok(date)) => TransactionPatch {
            description,
            amount,
            kind,
            category,
            date,
        },
        (d, a, k, c, dt) => return Err(collect([d.err(), a.err(), k.err(), c.err(), dt.err()])),
    };
    if patch.is_empty() {
        return Err(Error::validation("No fields to update"));
    }
    Ok(patch)
}

pub(crate) fn new_budget(form: &BudgetForm, owner: &str) -> Result<Budget> {
    let category = category(form.category.as_deref());
    let amount = required(form.amount.as_deref(), "Amount").and_then(budget_amount);
    let month = required(form.month.as_deref(), "Month").and_then(month);
    let year = required(form.year.as_deref(), "Year").and_then(budget_year);

    match (category, amount, month, year) {
        (Ok(category), Ok(amount), Ok(month), Ok(year)) => {
            let period = budget_period(month, year)?;
            Ok(Budget::new(owner.to_string(), category, amount, period))
        }
        (c, a, m, y) => Err(collect([c.err(), a.err(), m.err(), y.err()])),
    }
}

/// Parses the fields of a budget edit. The resulting month/year pair is
/// checked again once the patch is applied.
pub(crate) fn budget_patch(form: &BudgetForm) -> Result<BudgetPatch> {
    let category = form
        .category
        .as_deref()
        .map(|raw| category(Some(raw)))
        .transpose();
    let amount = form.amount.as_deref().map(budget_amount).transpose();
    let month = form.month.as_deref().map(month).transpose();
    let year = form.year.as_deref().map(budget_year).transpose();

    let patch = match (category, amount, month, year) {
        (Ok(category), Ok(amount), Ok(month), Ok(year)) => BudgetPatch {
            category,
            amount,
            month,
            year,
        },
        (c, a, m, y) => return Err(collect([c.err(), a.err(), m.err(), y.err()])),
    };
    if patch.is_empty() {
        return Err(Error::validation("No fields to update"));
    }
    Ok(patch)
}

/// The period a stored or patched budget refers to.
pub(crate) fn budget_period(month: u32, year: i32) -> Result<Period> {
    if year < MIN_BUDGET_YEAR {
        return Err(Error::validation("Year must be 2020 or later"));
    }
    Period::new(month, year).ok_or_else(|| Error::validation("Month must be between 0 and 11"))
}

// ── Queries ───────────────────────────────────────────────────

pub(crate) fn list_params(query: &ListQuery) -> Result<ListParams> {
    let page = query
        .page
        .as_deref()
        .map_or(Ok(1), |raw| bounded(raw, 1, usize::MAX, "Page must be a positive integer"));
    let limit = query.limit.as_deref().map_or(Ok(DEFAULT_PAGE_SIZE), |raw| {
        bounded(raw, 1, MAX_PAGE_SIZE, "Limit must be between 1 and 500")
    });
    let period = paired_period(&query.period);
    let category = query
        .category
        .as_deref()
        .map(|raw| category(Some(raw)))
        .transpose();
    let kind = query
        .kind
        .as_deref()
        .map(|raw| transaction_type(Some(raw)))
        .transpose();

    match (page, limit, period, category, kind) {
        (Ok(page), Ok(limit), Ok(period), Ok(category), Ok(kind)) => Ok(ListParams {
            page,
            limit,
            period,
            category,
            kind,
        }),
        (p, l, pe, c, k) => Err(collect([p.err(), l.err(), pe.err(), c.err(), k.err()])),
    }
}

/// Month and year default independently to the ones `now` falls in.
pub(crate) fn target_period(query: &PeriodQuery, now: NaiveDateTime) -> Result<Period> {
    let month = query.month.as_deref().map(month).transpose();
    let year = query.year.as_deref().map(year).transpose();
    match (month, year) {
        (Ok(month), Ok(year)) => crate::engine::target_period(month, year, now)
            .ok_or_else(|| Error::validation("Year must be a valid calendar year")),
        (m, y) => Err(collect([m.err(), y.err()])),
    }
}

/// `None` when neither part is given; both or neither are required.
pub(crate) fn optional_period(query: &PeriodQuery) -> Result<Option<Period>> {
    paired_period(query).map_err(Error::validation)
}

fn paired_period(query: &PeriodQuery) -> Field<Option<Period>> {
    match (query.month.as_deref(), query.year.as_deref()) {
        (None, None) => Ok(None),
        (Some(m), Some(y)) => {
            let month = month(m)?;
            let year = year(y)?;
            Period::new(month, year)
                .map(Some)
                .ok_or_else(|| "Year must be a valid calendar year".to_string())
        }
        _ => Err("Month and year must be provided together".to_string()),
    }
}

// ── Fields ────────────────────────────────────────────────────

fn collect<const N: usize>(errors: [Option<String>; N]) -> Error {
    Error::Validation(errors.into_iter().flatten().collect())
}

fn required<'a>(raw: Option<&'a str>, name: &str) -> Field<&'a str> {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(format!("{name} is required")),
    }
}

fn description(raw: Option<&str>) -> Field<String> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    let len = trimmed.chars().count();
    if len == 0 || len > DESCRIPTION_MAX {
        return Err(format!(
            "Description is required and must be at most {DESCRIPTION_MAX} characters"
        ));
    }
    Ok(trimmed.to_string())
}

fn decimal(raw: &str) -> Field<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|_| format!("Amount must be a number, got '{raw}'"))
}

fn money(amount: Decimal) -> Field<Decimal> {
    if amount > MAX_AMOUNT {
        return Err(format!("Amount must be at most {MAX_AMOUNT}"));
    }
    if amount.normalize().scale() > 2 {
        return Err("Amount must have at most 2 decimal places".to_string());
    }
    Ok(amount)
}

fn transaction_amount(raw: &str) -> Field<Decimal> {
    let amount = decimal(raw)?;
    if amount < MIN_AMOUNT {
        return Err("Amount must be greater than 0".to_string());
    }
    money(amount)
}

fn budget_amount(raw: &str) -> Field<Decimal> {
    let amount = decimal(raw)?;
    if amount < Decimal::ZERO {
        return Err("Amount must be greater than or equal to 0".to_string());
    }
    money(amount)
}

fn transaction_type(raw: Option<&str>) -> Field<TransactionType> {
    raw.and_then(|s| TransactionType::from_str(s).ok())
        .ok_or_else(|| "Type must be either income or expense".to_string())
}

fn category(raw: Option<&str>) -> Field<Category> {
    raw.and_then(|s| Category::from_str(s).ok())
        .ok_or_else(|| "Please provide a valid category".to_string())
}

/// `YYYY-MM-DD` (midnight), `YYYY-MM-DDTHH:MM:SS`, or `YYYY-MM-DD HH:MM:SS`.
fn date(raw: &str) -> Field<NaiveDateTime> {
    let s = raw.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| format!("Date must be YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS, got '{raw}'"))
}

fn month(raw: &str) -> Field<u32> {
    bounded(raw, 0, 11, "Month must be between 0 and 11")
}

fn year(raw: &str) -> Field<i32> {
    raw.trim()
        .parse()
        .map_err(|_| "Year must be a valid calendar year".to_string())
}

fn budget_year(raw: &str) -> Field<i32> {
    match year(raw) {
        Ok(y) if y >= MIN_BUDGET_YEAR => Ok(y),
        _ => Err("Year must be 2020 or later".to_string()),
    }
}

fn bounded<T>(raw: &str, min: T, max: T, msg: &str) -> Field<T>
where
    T: FromStr + PartialOrd,
{
    match raw.trim().parse::<T>() {
        Ok(v) if v >= min && v <= max => Ok(v),
        _ => Err(msg.to_string()),
    }
}
