use anyhow::{bail, Context, Result};
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::db::Database;
use crate::engine::{BudgetAlerts, Page};
use crate::error;
use crate::models::{Budget, Transaction};
use crate::query::{
    BudgetForm, Envelope, Facade, Insights, ListQuery, PeriodQuery, ProgressReport, Stats,
    TransactionForm,
};

/// Runs one command. `args[0]` is the program name; global flags are
/// already stripped.
pub(crate) fn as_cli(args: &[String], db: &Database, config: &Config) -> Result<()> {
    let facade = Facade::new(db, config.owner.as_str());
    let out = Output { json: config.json };
    let now = now();
    let rest = args.get(2..).unwrap_or_default();
    debug!(command = ?args.get(1), owner = %config.owner, json = config.json, "dispatching");

    match args.get(1).map(String::as_str) {
        None | Some("stats") => out.emit(facade.stats(&period_query(rest), now), None, render_stats),
        Some("add") => out.emit(
            facade.create_transaction(&transaction_form(rest), now),
            None,
            render_transaction,
        ),
        Some("edit") => {
            let id = parse_id(rest, "edit <id> [--desc ..] [--amount ..] [--type ..] [--category ..] [--date ..]")?;
            out.emit(
                facade.update_transaction(id, &transaction_form(rest), now),
                None,
                render_transaction,
            )
        }
        Some("rm") => {
            let id = parse_id(rest, "rm <id>")?;
            out.emit(
                facade.delete_transaction(id).map(|()| id),
                Some("Transaction deleted successfully"),
                |id| println!("Deleted transaction {id}"),
            )
        }
        Some("list" | "ls") => out.emit(facade.list_transactions(&list_query(rest)), None, render_page),
        Some("budgets") => out.emit(facade.budgets(&period_query(rest)), None, |b| render_budgets(b)),
        Some("budget") => cli_budget(rest, &facade, &out, now),
        Some("progress") => out.emit(facade.progress(&period_query(rest), now), None, render_progress),
        Some("insights") => out.emit(facade.insights(&period_query(rest), now), None, render_insights),
        Some("--help" | "-h" | "help") => {
            print_usage();
            Ok(())
        }
        Some("--version" | "-V" | "version") => {
            println!("finsight {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(other) => {
            print_usage();
            bail!("Unknown command: {other}");
        }
    }
}

fn cli_budget(args: &[String], facade: &Facade<'_>, out: &Output, now: NaiveDateTime) -> Result<()> {
    let rest = args.get(1..).unwrap_or_default();
    match args.first().map(String::as_str) {
        Some("add") => out.emit(facade.create_budget(&budget_form(rest)), None, render_budget),
        Some("set") => out.emit(facade.set_budget(&budget_form(rest), now), None, render_budget),
        Some("edit") => {
            let id = parse_id(rest, "budget edit <id> [--category ..] [--amount ..] [--month ..] [--year ..]")?;
            out.emit(facade.update_budget(id, &budget_form(rest)), None, render_budget)
        }
        Some("rm") => {
            let id = parse_id(rest, "budget rm <id>")?;
            out.emit(
                facade.delete_budget(id).map(|()| id),
                Some("Budget deleted successfully"),
                |id| println!("Deleted budget {id}"),
            )
        }
        _ => bail!("Usage: finsight budget <add|set|edit|rm> ..."),
    }
}

fn print_usage() {
    println!("FinSight - personal finance tracker with monthly budgets");
    println!();
    println!("Usage: finsight [--json] [--user <id>] [command]");
    println!();
    println!("Months are zero-based: 0 is January, 11 is December.");
    println!();
    println!("Commands:");
    println!("  (none), stats                 Monthly summary, categories and recent activity");
    println!("    --month <0-11> --year <Y>   Month to show (default: current)");
    println!("  add                           Record a transaction");
    println!("    --desc <text> --amount <n> --type <income|expense> --category <name>");
    println!("    [--date <YYYY-MM-DD[THH:MM:SS]>]");
    println!("  edit <id> [fields...]         Change fields of a transaction");
    println!("  rm <id>                       Delete a transaction");
    println!("  list, ls                      List transactions, newest first");
    println!("    --page <n> --limit <n> --month <0-11> --year <Y> --category <name> --type <t>");
    println!("  budgets [--month --year]      List budgets");
    println!("  budget add                    Create a budget");
    println!("    --category <name> --amount <n> --month <0-11> --year <Y>");
    println!("  budget set                    Create or replace a budget (month/year default: current)");
    println!("  budget edit <id> [fields...]  Change fields of a budget");
    println!("  budget rm <id>                Delete a budget");
    println!("  progress [--month --year]     Budget utilization and alerts");
    println!("  insights [--month --year]     Savings rate, daily spending and trend");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Environment: FINSIGHT_DB, FINSIGHT_USER, FINSIGHT_LOG");
}

// ── Output ────────────────────────────────────────────────────

struct Output {
    json: bool,
}

impl Output {
    /// Prints a façade result as an envelope or as text. A failed result
    /// becomes an error so the process exits non-zero.
    fn emit<T: Serialize>(
        &self,
        result: error::Result<T>,
        message: Option<&str>,
        render: impl FnOnce(&T),
    ) -> Result<()> {
        if !self.json {
            render(&result?);
            return Ok(());
        }

        let mut envelope = Envelope::from_result(result);
        if let (true, Some(message)) = (envelope.success, message) {
            envelope = envelope.with_message(message);
        }
        println!(
            "{}",
            envelope.to_json().context("Failed to serialize response")?
        );
        if !envelope.success {
            bail!(
                "Request failed ({}): {}",
                envelope.status,
                envelope.message.unwrap_or_default()
            );
        }
        Ok(())
    }
}

fn now() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

// ── Argument parsing ──────────────────────────────────────────

fn flag(args: &[String], name: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == name).map(|w| w[1].clone())
}

fn parse_id(args: &[String], usage: &str) -> Result<i64> {
    let raw = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .with_context(|| format!("Usage: finsight {usage}"))?;
    raw.parse()
        .with_context(|| format!("Invalid id: {raw}"))
}

fn period_query(args: &[String]) -> PeriodQuery {
    PeriodQuery {
        month: flag(args, "--month"),
        year: flag(args, "--year"),
    }
}

fn transaction_form(args: &[String]) -> TransactionForm {
    TransactionForm {
        description: flag(args, "--desc"),
        amount: flag(args, "--amount"),
        kind: flag(args, "--type"),
        category: flag(args, "--category"),
        date: flag(args, "--date"),
    }
}

fn budget_form(args: &[String]) -> BudgetForm {
    BudgetForm {
        category: flag(args, "--category"),
        amount: flag(args, "--amount"),
        month: flag(args, "--month"),
        year: flag(args, "--year"),
    }
}

fn list_query(args: &[String]) -> ListQuery {
    ListQuery {
        page: flag(args, "--page"),
        limit: flag(args, "--limit"),
        period: period_query(args),
        category: flag(args, "--category"),
        kind: flag(args, "--type"),
    }
}

// ── Text rendering ────────────────────────────────────────────

fn transaction_line(t: &Transaction) -> String {
    format!(
        "{:<5} {}  {:<8} {:>12.2}  {:<18} {}",
        t.id.unwrap_or(0),
        t.date.format("%Y-%m-%d"),
        t.kind,
        t.signed_amount(),
        t.category,
        t.description,
    )
}

fn render_transaction(t: &Transaction) {
    println!("{}", transaction_line(t));
}

fn render_page(page: &Page<Transaction>) {
    if page.items.is_empty() {
        println!("No transactions");
    }
    for t in &page.items {
        println!("{}", transaction_line(t));
    }
    println!(
        "Page {} of {} ({} transactions)",
        page.page, page.page_count, page.total
    );
}

fn render_stats(stats: &Stats) {
    let m = &stats.monthly;
    println!("FinSight - {:04}-{:02}", m.year, m.month + 1);
    println!("{}", "─".repeat(40));
    println!("  Income:     ${:.2}", m.income);
    println!("  Expenses:   ${:.2}", m.expenses);
    println!("  Balance:    ${:.2}", m.balance);
    println!(
        "  Top:        {}",
        stats
            .top_category
            .map_or("none", |c| c.as_str())
    );

    if !stats.categories.is_empty() {
        println!();
        println!("Spending by Category:");
        for c in &stats.categories {
            println!("  {:<24} ${:.2} ({})", c.category, c.total, c.count);
        }
    }

    if !stats.recent_transactions.is_empty() {
        println!();
        println!("Recent:");
        for t in &stats.recent_transactions {
            println!("  {}", transaction_line(t));
        }
    }
}

fn render_budget(b: &Budget) {
    println!(
        "{:<5} {:04}-{:02}  {:<24} ${:.2}",
        b.id.unwrap_or(0),
        b.year,
        b.month + 1,
        b.category,
        b.amount
    );
}

fn render_budgets(budgets: &[Budget]) {
    if budgets.is_empty() {
        println!("No budgets");
    }
    for b in budgets {
        render_budget(b);
    }
}

fn render_progress(report: &ProgressReport) {
    println!("Budgets - {}", report.period);
    println!("{}", "─".repeat(60));
    for p in &report.budgets {
        println!(
            "  {:<24} ${:>10.2} of ${:>10.2}  {:>7.2}%  {}",
            p.category, p.spent, p.amount, p.percentage, p.status
        );
    }
    println!();
    match &report.alerts {
        BudgetAlerts::NoBudgets => println!("No budgets set for this month"),
        BudgetAlerts::AllWithinBudget => println!("All budgets are on track"),
        BudgetAlerts::Attention(flagged) => {
            for p in flagged {
                println!(
                    "  ! {} is {} (${:.2} remaining)",
                    p.category, p.status, p.remaining
                );
            }
        }
    }
}

fn render_insights(insights: &Insights) {
    let m = &insights.monthly;
    println!("Insights - {:04}-{:02}", m.year, m.month + 1);
    println!("{}", "─".repeat(40));
    println!("  Savings rate:        {:.2}%", insights.savings_rate);
    println!("  Avg daily spending:  ${:.2}", insights.average_daily_spending);
    println!(
        "  Top category:        {}",
        insights.top_category.map_or("none", |c| c.as_str())
    );
    let b = &insights.budget;
    if b.budget_count > 0 {
        println!(
            "  Budgeted:            ${:.2} across {} ({}${:.2} left)",
            b.total_budget,
            b.budget_count,
            if b.over_budget { "-" } else { "" },
            b.remaining.abs()
        );
    }

    if !insights.trend.is_empty() {
        println!();
        println!("Monthly expenses:");
        for t in &insights.trend {
            println!("  {:04}-{:02}  ${:.2}", t.year, t.month + 1, t.total);
        }
    }
}
