pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    owner       TEXT NOT NULL,
    description TEXT NOT NULL,
    amount      TEXT NOT NULL,
    type        TEXT NOT NULL CHECK (type IN ('income', 'expense')),
    category    TEXT NOT NULL,
    date        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_owner_date ON transactions(owner, date);
CREATE INDEX IF NOT EXISTS idx_transactions_owner_category ON transactions(owner, category);

CREATE TABLE IF NOT EXISTS budgets (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    owner    TEXT NOT NULL,
    category TEXT NOT NULL,
    amount   TEXT NOT NULL,
    month    INTEGER NOT NULL CHECK (month BETWEEN 0 AND 11),
    year     INTEGER NOT NULL,
    UNIQUE(owner, category, month, year)
);

CREATE INDEX IF NOT EXISTS idx_budgets_owner_period ON budgets(owner, year, month);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
