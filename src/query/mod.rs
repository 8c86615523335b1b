//! The query façade: one owner's view of the record store.
//!
//! Validates raw input, enforces ownership, loads snapshots from the store
//! and hands them to the engine. The reference instant `now` is always a
//! parameter; nothing below this layer reads the clock.

mod envelope;
mod validate;

pub(crate) use envelope::Envelope;
pub(crate) use validate::{BudgetForm, ListQuery, PeriodQuery, TransactionForm};

use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::db::{Database, TransactionFilter};
use crate::engine::{
    self, BudgetAlerts, BudgetOverview, BudgetProgress, CategoryTotal, MonthTotal, Page,
    PeriodSummary,
};
use crate::error::{Error, Result};
use crate::models::{Budget, Category, Period, Transaction};

/// How many transactions the statistics call lists as recent.
const RECENT_LIMIT: usize = 5;
/// How many active months the insights trend covers.
const TREND_MONTHS: usize = 6;

/// Monthly dashboard statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Stats {
    pub monthly: PeriodSummary,
    pub categories: Vec<CategoryTotal>,
    /// `None` (null) when nothing was spent in the period.
    pub top_category: Option<Category>,
    /// Newest transactions regardless of period.
    pub recent_transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ProgressReport {
    pub period: Period,
    pub budgets: Vec<BudgetProgress>,
    pub alerts: BudgetAlerts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Insights {
    pub monthly: PeriodSummary,
    pub savings_rate: Decimal,
    pub average_daily_spending: Decimal,
    pub top_category: Option<Category>,
    pub budget: BudgetOverview,
    pub trend: Vec<MonthTotal>,
}

pub(crate) struct Facade<'a> {
    db: &'a Database,
    owner: String,
}

impl<'a> Facade<'a> {
    pub(crate) fn new(db: &'a Database, owner: impl Into<String>) -> Self {
        Self {
            db,
            owner: owner.into(),
        }
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn create_transaction(
        &self,
        form: &TransactionForm,
        now: NaiveDateTime,
    ) -> Result<Transaction> {
        let mut txn = validate::new_transaction(form, &self.owner, now)?;
        txn.id = Some(self.db.insert_transaction(&txn)?);
        info!(owner = %self.owner, id = ?txn.id, kind = %txn.kind, "created transaction");
        Ok(txn)
    }

    pub(crate) fn update_transaction(
        &self,
        id: i64,
        form: &TransactionForm,
        now: NaiveDateTime,
    ) -> Result<Transaction> {
        let mut txn = self.owned_transaction(id, "update this transaction")?;
        let patch = validate::transaction_patch(form)?;
        patch.apply(&mut txn);
        txn.updated_at = now;
        if !self.db.update_transaction(&txn)? {
            return Err(Error::NotFound("Transaction".into()));
        }
        info!(owner = %self.owner, id, "updated transaction");
        Ok(txn)
    }

    pub(crate) fn delete_transaction(&self, id: i64) -> Result<()> {
        self.owned_transaction(id, "delete this transaction")?;
        if !self.db.delete_transaction(id)? {
            return Err(Error::NotFound("Transaction".into()));
        }
        info!(owner = %self.owner, id, "deleted transaction");
        Ok(())
    }

    /// Newest-first listing, optionally narrowed to a month, category and type.
    pub(crate) fn list_transactions(&self, query: &ListQuery) -> Result<Page<Transaction>> {
        let params = validate::list_params(query)?;
        let filter = TransactionFilter {
            category: params.category,
            kind: params.kind,
            ..params
                .period
                .map(TransactionFilter::within)
                .unwrap_or_default()
        };
        let txns = self.db.find_transactions(&self.owner, &filter)?;
        let page = engine::paginate(&txns, params.page, params.limit);
        debug!(
            owner = %self.owner,
            page = page.page,
            total = page.total,
            "listed transactions"
        );
        Ok(page)
    }

    // ── Statistics ────────────────────────────────────────────

    pub(crate) fn stats(&self, query: &PeriodQuery, now: NaiveDateTime) -> Result<Stats> {
        let period = validate::target_period(query, now)?;
        let txns = self.snapshot()?;
        let categories = engine::category_breakdown(&txns, period);

        Ok(Stats {
            monthly: engine::summarize(&txns, period),
            top_category: engine::top_category(&categories),
            categories,
            recent_transactions: engine::recent(&txns, RECENT_LIMIT).to_vec(),
        })
    }

    pub(crate) fn progress(&self, query: &PeriodQuery, now: NaiveDateTime) -> Result<ProgressReport> {
        let period = validate::target_period(query, now)?;
        let txns = self
            .db
            .find_transactions(&self.owner, &TransactionFilter::within(period))?;
        let budgets = self.budgets_for(period)?;

        let breakdown = engine::category_breakdown(&txns, period);
        let progress = engine::budget_progress(&budgets, &breakdown, period);
        let alerts = engine::budget_alerts(&progress);
        if let BudgetAlerts::Attention(flagged) = &alerts {
            debug!(owner = %self.owner, %period, flagged = flagged.len(), "budgets need attention");
        }

        Ok(ProgressReport {
            period,
            budgets: progress,
            alerts,
        })
    }

    pub(crate) fn insights(&self, query: &PeriodQuery, now: NaiveDateTime) -> Result<Insights> {
        let period = validate::target_period(query, now)?;
        let txns = self.snapshot()?;
        let budgets = self.budgets_for(period)?;

        let monthly = engine::summarize(&txns, period);
        let categories = engine::category_breakdown(&txns, period);

        Ok(Insights {
            savings_rate: engine::savings_rate(&monthly),
            average_daily_spending: engine::average_daily_spending(&monthly, period, now),
            top_category: engine::top_category(&categories),
            budget: engine::budget_overview(&budgets, &monthly, period),
            trend: engine::monthly_expense_trend(&txns, period, TREND_MONTHS),
            monthly,
        })
    }

    // ── Budgets ───────────────────────────────────────────────

    /// All budgets, or those of one month when month and year are both given.
    pub(crate) fn budgets(&self, query: &PeriodQuery) -> Result<Vec<Budget>> {
        match validate::optional_period(query)? {
            Some(period) => self.budgets_for(period),
            None => self.db.find_budgets(&self.owner, None, None),
        }
    }

    pub(crate) fn create_budget(&self, form: &BudgetForm) -> Result<Budget> {
        let mut budget = validate::new_budget(form, &self.owner)?;
        budget.id = Some(self.db.insert_budget(&budget)?);
        info!(owner = %self.owner, id = ?budget.id, category = %budget.category, "created budget");
        Ok(budget)
    }

    pub(crate) fn update_budget(&self, id: i64, form: &BudgetForm) -> Result<Budget> {
        let mut budget = self.owned_budget(id, "update this budget")?;
        let patch = validate::budget_patch(form)?;
        patch.apply(&mut budget);
        validate::budget_period(budget.month, budget.year)?;
        if !self.db.update_budget(&budget)? {
            return Err(Error::NotFound("Budget".into()));
        }
        info!(owner = %self.owner, id, "updated budget");
        Ok(budget)
    }

    pub(crate) fn delete_budget(&self, id: i64) -> Result<()> {
        self.owned_budget(id, "delete this budget")?;
        if !self.db.delete_budget(id)? {
            return Err(Error::NotFound("Budget".into()));
        }
        info!(owner = %self.owner, id, "deleted budget");
        Ok(())
    }

    /// Sets the amount of the budget for a category and month, creating it
    /// if it does not exist yet. Month and year default to `now`.
    pub(crate) fn set_budget(&self, form: &BudgetForm, now: NaiveDateTime) -> Result<Budget> {
        let scoped = BudgetForm {
            month: form.month.clone().or_else(|| Some(now.month0().to_string())),
            year: form.year.clone().or_else(|| Some(now.year().to_string())),
            ..form.clone()
        };
        let wanted = validate::new_budget(&scoped, &self.owner)?;
        let period = validate::budget_period(wanted.month, wanted.year)?;

        match self.db.find_budget_for(&self.owner, wanted.category, period)? {
            Some(mut existing) => {
                existing.amount = wanted.amount;
                if !self.db.update_budget(&existing)? {
                    return Err(Error::NotFound("Budget".into()));
                }
                info!(owner = %self.owner, id = ?existing.id, "reset budget amount");
                Ok(existing)
            }
            None => self.create_budget(&scoped),
        }
    }

    // ── Helpers ───────────────────────────────────────────────

    /// Every transaction of the owner, newest first.
    fn snapshot(&self) -> Result<Vec<Transaction>> {
        self.db
            .find_transactions(&self.owner, &TransactionFilter::default())
    }

    fn budgets_for(&self, period: Period) -> Result<Vec<Budget>> {
        self.db
            .find_budgets(&self.owner, Some(period.month()), Some(period.year()))
    }

    fn owned_transaction(&self, id: i64, action: &str) -> Result<Transaction> {
        let txn = self
            .db
            .get_transaction(id)?
            .ok_or_else(|| Error::NotFound("Transaction".into()))?;
        if txn.owner != self.owner {
            return Err(Error::NotAuthorized(action.into()));
        }
        Ok(txn)
    }

    fn owned_budget(&self, id: i64, action: &str) -> Result<Budget> {
        let budget = self
            .db
            .get_budget(id)?
            .ok_or_else(|| Error::NotFound("Budget".into()))?;
        if budget.owner != self.owner {
            return Err(Error::NotAuthorized(action.into()));
        }
        Ok(budget)
    }
}
