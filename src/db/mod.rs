mod schema;

use anyhow::Context;
use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, Type};
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::*;

/// Text layout of every stored timestamp. Lexical order is chronological.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DUPLICATE_BUDGET: &str =
    "Budget for this category already exists for the specified month and year";

const TRANSACTION_COLUMNS: &str =
    "id, owner, description, amount, type, category, date, created_at, updated_at";

const BUDGET_COLUMNS: &str = "id, owner, category, amount, month, year";

/// Optional constraints for [`Database::find_transactions`]. Empty matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TransactionFilter {
    /// Inclusive lower bound on `date`.
    pub from: Option<NaiveDateTime>,
    /// Inclusive upper bound on `date`.
    pub to: Option<NaiveDateTime>,
    pub category: Option<Category>,
    pub kind: Option<TransactionType>,
}

impl TransactionFilter {
    pub(crate) fn within(period: Period) -> Self {
        Self {
            from: Some(period.start()),
            to: Some(period.end()),
            ..Self::default()
        }
    }
}

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        debug!(path = %path.display(), "opened record store");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            debug!(version = schema::CURRENT_VERSION, "created schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            debug!(from = current, to = schema::CURRENT_VERSION, "migrated schema");
        }

        Ok(())
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (owner, description, amount, type, category, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                txn.owner,
                txn.description,
                txn.amount.to_string(),
                txn.kind.as_str(),
                txn.category.as_str(),
                format_timestamp(txn.date),
                format_timestamp(txn.created_at),
                format_timestamp(txn.updated_at),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, owner = %txn.owner, "inserted transaction");
        Ok(id)
    }

    pub(crate) fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let result = self.conn.query_row(
            &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
            params![id],
            transaction_from_row,
        );
        match result {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes every field of a stored transaction back. Returns `false` when
    /// no row has `txn.id`.
    pub(crate) fn update_transaction(&self, txn: &Transaction) -> Result<bool> {
        let Some(id) = txn.id else {
            return Ok(false);
        };
        let changed = self.conn.execute(
            "UPDATE transactions
             SET description = ?1, amount = ?2, type = ?3, category = ?4, date = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                txn.description,
                txn.amount.to_string(),
                txn.kind.as_str(),
                txn.category.as_str(),
                format_timestamp(txn.date),
                format_timestamp(txn.updated_at),
                id,
            ],
        )?;
        debug!(id, changed, "updated transaction");
        Ok(changed > 0)
    }

    pub(crate) fn delete_transaction(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        debug!(id, changed, "deleted transaction");
        Ok(changed > 0)
    }

    /// All of `owner`'s transactions matching `filter`, newest first
    /// (`date DESC, id DESC`).
    pub(crate) fn find_transactions(
        &self,
        owner: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE owner = ?1");
        let mut param_values: Vec<Box<dyn ToSql>> = vec![Box::new(owner.to_string())];

        if let Some(from) = filter.from {
            sql.push_str(&format!(" AND date >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(format_timestamp(from)));
        }
        if let Some(to) = filter.to {
            sql.push_str(&format!(" AND date <= ?{}", param_values.len() + 1));
            param_values.push(Box::new(format_timestamp(to)));
        }
        if let Some(category) = filter.category {
            sql.push_str(&format!(" AND category = ?{}", param_values.len() + 1));
            param_values.push(Box::new(category.as_str()));
        }
        if let Some(kind) = filter.kind {
            sql.push_str(&format!(" AND type = ?{}", param_values.len() + 1));
            param_values.push(Box::new(kind.as_str()));
        }

        sql.push_str(" ORDER BY date DESC, id DESC");

        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), transaction_from_row)?;
        let txns = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(owner, count = txns.len(), ?filter, "loaded transactions");
        Ok(txns)
    }

    // ── Budgets ───────────────────────────────────────────────

    /// Fails with [`Error::Conflict`] when the owner already has a budget
    /// for that category and period.
    pub(crate) fn insert_budget(&self, budget: &Budget) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO budgets (owner, category, amount, month, year)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    budget.owner,
                    budget.category.as_str(),
                    budget.amount.to_string(),
                    budget.month,
                    budget.year,
                ],
            )
            .map_err(budget_conflict)?;
        let id = self.conn.last_insert_rowid();
        debug!(id, owner = %budget.owner, category = %budget.category, "inserted budget");
        Ok(id)
    }

    pub(crate) fn get_budget(&self, id: i64) -> Result<Option<Budget>> {
        let result = self.conn.query_row(
            &format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = ?1"),
            params![id],
            budget_from_row,
        );
        match result {
            Ok(b) => Ok(Some(b)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Same uniqueness rule as [`Database::insert_budget`].
    pub(crate) fn update_budget(&self, budget: &Budget) -> Result<bool> {
        let Some(id) = budget.id else {
            return Ok(false);
        };
        let changed = self
            .conn
            .execute(
                "UPDATE budgets SET category = ?1, amount = ?2, month = ?3, year = ?4 WHERE id = ?5",
                params![
                    budget.category.as_str(),
                    budget.amount.to_string(),
                    budget.month,
                    budget.year,
                    id,
                ],
            )
            .map_err(budget_conflict)?;
        debug!(id, changed, "updated budget");
        Ok(changed > 0)
    }

    pub(crate) fn delete_budget(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM budgets WHERE id = ?1", params![id])?;
        debug!(id, changed, "deleted budget");
        Ok(changed > 0)
    }

    /// `owner`'s budgets, optionally narrowed to a month and/or year,
    /// ordered by category label then id.
    pub(crate) fn find_budgets(
        &self,
        owner: &str,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<Budget>> {
        let mut sql = format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE owner = ?1");
        let mut param_values: Vec<Box<dyn ToSql>> = vec![Box::new(owner.to_string())];

        if let Some(m) = month {
            sql.push_str(&format!(" AND month = ?{}", param_values.len() + 1));
            param_values.push(Box::new(m));
        }
        if let Some(y) = year {
            sql.push_str(&format!(" AND year = ?{}", param_values.len() + 1));
            param_values.push(Box::new(y));
        }

        sql.push_str(" ORDER BY category, id");

        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), budget_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn find_budget_for(
        &self,
        owner: &str,
        category: Category,
        period: Period,
    ) -> Result<Option<Budget>> {
        let result = self.conn.query_row(
            &format!(
                "SELECT {BUDGET_COLUMNS} FROM budgets
                 WHERE owner = ?1 AND category = ?2 AND month = ?3 AND year = ?4"
            ),
            params![owner, category.as_str(), period.month(), period.year()],
            budget_from_row,
        );
        match result {
            Ok(b) => Ok(Some(b)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// ── Row mapping ───────────────────────────────────────────────

fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
}

/// Reads a TEXT column and parses it, reporting bad data as a conversion failure.
fn parsed<T, E>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> std::result::Result<T, E>,
) -> rusqlite::Result<T>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: Some(row.get(0)?),
        owner: row.get(1)?,
        description: row.get(2)?,
        amount: parsed(row, 3, rust_decimal::Decimal::from_str)?,
        kind: parsed(row, 4, TransactionType::from_str)?,
        category: parsed(row, 5, Category::from_str)?,
        date: parsed(row, 6, parse_timestamp)?,
        created_at: parsed(row, 7, parse_timestamp)?,
        updated_at: parsed(row, 8, parse_timestamp)?,
    })
}

fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: Some(row.get(0)?),
        owner: row.get(1)?,
        category: parsed(row, 2, Category::from_str)?,
        amount: parsed(row, 3, rust_decimal::Decimal::from_str)?,
        month: row.get(4)?,
        year: row.get(5)?,
    })
}

fn budget_conflict(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::Conflict(DUPLICATE_BUDGET.to_string())
        }
        other => Error::Store(other),
    }
}
