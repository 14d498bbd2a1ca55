use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::numeric::Numeric;
use crate::errors::{FinanceError, Result};

/// Direction of a ledger entry. The sign of an amount lives here, never in
/// the stored number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Applies the kind's sign to a magnitude.
    pub fn signed(&self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = FinanceError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FinanceError::InvalidTransaction(format!(
                "unknown transaction type `{}`",
                other
            ))),
        }
    }
}

/// One immutable ledger event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRecord")]
pub struct Transaction {
    id: u64,
    amount: f64,
    #[serde(rename = "type")]
    kind: TransactionKind,
    category: String,
    date: NaiveDate,
    description: String,
}

impl Transaction {
    /// Builds a transaction, rejecting negative or non-finite amounts.
    ///
    /// The category is not checked against any vocabulary so that entries keep
    /// their label even if the category later disappears.
    pub fn new(
        id: u64,
        amount: f64,
        kind: TransactionKind,
        category: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(FinanceError::InvalidTransaction(format!(
                "amount must be a non-negative number, got {}",
                amount
            )));
        }
        Ok(Self {
            id,
            amount,
            kind,
            category: category.into(),
            date,
            description: description.into(),
        })
    }

    /// Rehydrates a transaction from a plain persisted record, re-coercing the
    /// amount and date from their stored representation.
    pub fn from_record(record: TransactionRecord) -> Result<Self> {
        let amount = record.amount.to_f64().ok_or_else(|| {
            FinanceError::InvalidTransaction(format!(
                "transaction {} has a non-numeric amount",
                record.id
            ))
        })?;
        let kind = record.kind.parse::<TransactionKind>()?;
        let date = parse_date(&record.date).ok_or_else(|| {
            FinanceError::InvalidTransaction(format!(
                "transaction {} has an unreadable date `{}`",
                record.id, record.date
            ))
        })?;
        Self::new(
            record.id,
            amount,
            kind,
            record.category,
            date,
            record.description.unwrap_or_default(),
        )
    }

    pub fn to_record(&self) -> TransactionRecord {
        TransactionRecord {
            id: self.id,
            amount: Numeric::Number(self.amount),
            kind: self.kind.as_str().to_string(),
            category: self.category.clone(),
            date: self.date.format(DATE_FORMAT).to_string(),
            description: Some(self.description.clone()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Amount with the kind's sign applied.
    pub fn signed_amount(&self) -> f64 {
        self.kind.signed(self.amount)
    }
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = FinanceError;

    fn try_from(record: TransactionRecord) -> Result<Self> {
        Transaction::from_record(record)
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Plain persisted shape of a transaction, tolerant of the loose typing some
/// storage layers produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: u64,
    pub amount: Numeric,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp; only the calendar date is
/// kept.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
