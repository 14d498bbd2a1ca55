//! Ledger entities: transactions, users and the aggregates derived from them.

pub mod budget;
pub mod filter;
pub mod numeric;
pub mod transaction;
pub mod user;

pub use budget::{BudgetStatus, BudgetTier, EXCEEDED_PERCENT, WARNING_PERCENT};
pub use filter::TransactionFilter;
pub use numeric::Numeric;
pub use transaction::{parse_date, Transaction, TransactionKind, TransactionRecord};
pub use user::{default_categories, Role, User, UserRecord, UserSummary, DEFAULT_CATEGORIES};
