use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// A single income or expense record, as held by the store.
///
/// `amount` is always positive; the direction lives in `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<i64>,
    pub owner: String,
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: Category,
    pub date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Transaction {
    /// A not-yet-stored transaction. Audit timestamps are set to `now`.
    pub fn new(
        owner: String,
        description: String,
        amount: Decimal,
        kind: TransactionType,
        category: Category,
        date: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: None,
            owner,
            description,
            amount,
            kind,
            category,
            date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Amount with the direction applied: negative for expenses.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// Field changes for an existing transaction. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<TransactionType>,
    pub category: Option<Category>,
    pub date: Option<NaiveDateTime>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
            && self.category.is_none()
            && self.date.is_none()
    }

    pub fn apply(&self, txn: &mut Transaction) {
        if let Some(description) = &self.description {
            txn.description = description.clone();
        }
        if let Some(amount) = self.amount {
            txn.amount = amount;
        }
        if let Some(kind) = self.kind {
            txn.kind = kind;
        }
        if let Some(category) = self.category {
            txn.category = category;
        }
        if let Some(date) = self.date {
            txn.date = date;
        }
    }
}
