//! Monthly aggregation and budget-progress computations.
//!
//! Every function here is a pure computation over a snapshot handed in by
//! the caller: no I/O, no clock reads, no caching. Inputs are assumed to be
//! validated already; missing data produces empty results, never errors.

mod breakdown;
mod insights;
mod period;
mod progress;
mod window;

pub use breakdown::{category_breakdown, top_category, CategoryTotal};
pub use insights::{
    average_daily_spending, budget_overview, monthly_expense_trend, savings_rate, BudgetOverview,
    MonthTotal,
};
pub use period::{summarize, target_period, PeriodSummary};
pub use progress::{budget_alerts, budget_progress, BudgetAlerts, BudgetProgress};
pub use window::{paginate, recent, Page};

#[cfg(test)]
mod tests;
