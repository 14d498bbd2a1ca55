use std::result::Result as StdResult;

use thiserror::Error;

/// Failures surfaced by the ledger and session layers. All of them are
/// recoverable by the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FinanceError {
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Invalid budget: {0}")]
    InvalidBudget(f64),
    #[error("Invalid category: {0:?}")]
    InvalidCategory(String),
    #[error("No active session")]
    NotAuthenticated,
    #[error("Session user {0} is no longer in the roster")]
    StaleSession(u64),
    #[error("Administrator session required")]
    AdminRequired,
    #[error("Report error: {0}")]
    Report(String),
}

pub type Result<T> = StdResult<T, FinanceError>;

/// Errors raised inside a persistent store. The core never sees these: stores
/// log them and report an absent value instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),
}

impl From<csv::Error> for FinanceError {
    fn from(err: csv::Error) -> Self {
        FinanceError::Report(err.to_string())
    }
}

impl From<std::io::Error> for FinanceError {
    fn from(err: std::io::Error) -> Self {
        FinanceError::Report(err.to_string())
    }
}

/// Errors raised while loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
}
