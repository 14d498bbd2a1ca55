use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{
    budget::BudgetStatus,
    filter::TransactionFilter,
    numeric::Numeric,
    transaction::{Transaction, TransactionKind, TransactionRecord},
};
use crate::{
    errors::{FinanceError, Result},
    utils::time::{next_id, Clock},
};

/// Vocabulary given to any user whose category set is empty.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Salario",
    "Alimentación",
    "Transporte",
    "Vivienda",
    "Servicios",
    "Entretenimiento",
    "Salud",
    "Educación",
    "Otros",
];

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect()
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account together with its ledger, budget and categories.
///
/// Aggregates such as the balance are derived from the transaction history on
/// every call; nothing derived is stored. The only mutations are
/// [`User::add_transaction`], [`User::set_budget`] and [`User::add_category`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "UserRecord")]
pub struct User {
    id: u64,
    name: String,
    email: String,
    password: String,
    role: Role,
    budget: f64,
    transactions: Vec<Transaction>,
    categories: Vec<String>,
}

impl User {
    /// Creates a user with no budget, the default categories and an empty ledger.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role,
            budget: 0.0,
            transactions: Vec::new(),
            categories: default_categories(),
        }
    }

    /// Rehydrates a user from its persisted record.
    ///
    /// Nested transactions go through [`Transaction::from_record`]; entries that
    /// cannot be coerced are dropped with a warning rather than discarding the
    /// whole account. An empty category set is replaced by the defaults.
    pub fn from_data(record: UserRecord) -> Self {
        let UserRecord {
            id,
            name,
            email,
            password,
            role,
            budget,
            transactions,
            categories,
        } = record;

        let budget = match budget {
            None => 0.0,
            Some(raw) => match raw.to_f64() {
                Some(value) if value >= 0.0 => value,
                _ => {
                    warn!(user = id, budget = ?raw, "discarding unusable stored budget");
                    0.0
                }
            },
        };

        let transactions = transactions
            .unwrap_or_default()
            .into_iter()
            .filter_map(|record| match Transaction::from_record(record) {
                Ok(txn) => Some(txn),
                Err(err) => {
                    warn!(user = id, error = %err, "skipping malformed stored transaction");
                    None
                }
            })
            .collect();

        let mut unique: Vec<String> = Vec::new();
        for category in categories.unwrap_or_default() {
            if !unique.contains(&category) {
                unique.push(category);
            }
        }
        if unique.is_empty() {
            unique = default_categories();
        }

        Self {
            id,
            name,
            email,
            password,
            role,
            budget,
            transactions,
            categories: unique,
        }
    }

    /// Plain record form, the inverse of [`User::from_data`].
    pub fn to_data(&self) -> UserRecord {
        UserRecord {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            role: self.role,
            budget: Some(Numeric::Number(self.budget)),
            transactions: Some(self.transactions.iter().map(Transaction::to_record).collect()),
            categories: Some(self.categories.clone()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Income minus expenses over the full history.
    pub fn balance(&self) -> f64 {
        self.transactions
            .iter()
            .fold(0.0, |acc, txn| acc + txn.signed_amount())
    }

    pub fn total_income(&self) -> f64 {
        self.total_of(TransactionKind::Income)
    }

    pub fn total_expense(&self) -> f64 {
        self.total_of(TransactionKind::Expense)
    }

    fn total_of(&self, kind: TransactionKind) -> f64 {
        self.transactions
            .iter()
            .filter(|txn| txn.kind() == kind)
            .map(Transaction::amount)
            .sum()
    }

    /// `total_expense / budget`, or `None` while no budget is set.
    pub fn budget_utilization(&self) -> Option<f64> {
        (self.budget > 0.0).then(|| self.total_expense() / self.budget)
    }

    /// Classifies a caller-supplied expense total against this user's budget.
    pub fn budget_status_for(&self, total_expense: f64) -> BudgetStatus {
        BudgetStatus::classify(self.budget, total_expense)
    }

    /// Classification against the all-time expense total.
    pub fn budget_status(&self) -> BudgetStatus {
        self.budget_status_for(self.total_expense())
    }

    /// Appends to the ledger. Duplicate ids are not rejected.
    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn set_budget(&mut self, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(FinanceError::InvalidBudget(amount));
        }
        self.budget = amount;
        Ok(())
    }

    /// Adds a category if it is not already present. Returns whether the set
    /// changed.
    pub fn add_category(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FinanceError::InvalidCategory(name.to_string()));
        }
        if self.categories.iter().any(|existing| existing == name) {
            return Ok(false);
        }
        self.categories.push(name.to_string());
        Ok(true)
    }

    /// Id for the next transaction: timestamp-derived and unique within this
    /// ledger.
    pub fn next_transaction_id(&self, clock: &dyn Clock) -> u64 {
        next_id(clock, self.transactions.iter().map(Transaction::id))
    }

    /// Matching transactions, newest date first. Entries sharing a date keep
    /// their insertion order.
    pub fn filtered_transactions(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        let mut matches: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|txn| filter.matches(txn))
            .collect();
        matches.sort_by(|a, b| b.date().cmp(&a.date()));
        matches
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User::from_data(record)
    }
}

/// Persisted shape of a user. Numeric and collection fields are lenient so
/// records written by loosely typed stores still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub budget: Option<Numeric>,
    #[serde(default)]
    pub transactions: Option<Vec<TransactionRecord>>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// Identity of a user without credentials or ledger data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::budget::BudgetTier;
    use chrono::NaiveDate;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn txn(id: u64, amount: f64, kind: TransactionKind, category: &str, day: u32) -> Transaction {
        Transaction::new(id, amount, kind, category, date(2024, 1, day), "").unwrap()
    }

    #[test]
    fn new_user_starts_with_defaults() {
        let user = User::new(5, "Ana", "ana@x.com", "pw1", Role::User);
        assert_eq!(user.budget(), 0.0);
        assert!(user.transactions().is_empty());
        assert_eq!(user.categories(), default_categories().as_slice());
        assert_eq!(user.balance(), 0.0);
        assert_eq!(user.budget_utilization(), None);
    }

    #[test]
    fn balance_subtracts_expenses_from_income() {
        let mut user = User::new(5, "Ana", "ana@x.com", "pw1", Role::User);
        user.add_transaction(txn(1, 1000.0, TransactionKind::Income, "Salario", 1));
        user.add_transaction(txn(2, 200.0, TransactionKind::Expense, "Alimentación", 2));
        assert_eq!(user.balance(), 800.0);
        assert_eq!(user.total_income(), 1000.0);
        assert_eq!(user.total_expense(), 200.0);
        assert_eq!(user.transaction_count(), 2);
    }

    #[test]
    fn balance_does_not_depend_on_insertion_order() {
        let entries = [
            txn(1, 1000.0, TransactionKind::Income, "Salario", 1),
            txn(2, 200.0, TransactionKind::Expense, "Alimentación", 2),
            txn(3, 0.25, TransactionKind::Income, "Otros", 3),
            txn(4, 55.5, TransactionKind::Expense, "Salud", 4),
        ];
        let orders: [[usize; 4]; 4] = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];
        let balances: Vec<f64> = orders
            .iter()
            .map(|order| {
                let mut user = User::new(5, "Ana", "ana@x.com", "pw1", Role::User);
                for &index in order {
                    user.add_transaction(entries[index].clone());
                }
                user.balance()
            })
            .collect();
        assert!(balances.iter().all(|&balance| balance == 744.75), "{balances:?}");
    }

    #[test]
    fn set_budget_rejects_negative_amounts() {
        let mut user = User::new(5, "Ana", "ana@x.com", "pw1", Role::User);
        assert_eq!(user.set_budget(-1.0), Err(FinanceError::InvalidBudget(-1.0)));
        assert_eq!(user.budget(), 0.0);
        user.set_budget(1000.0).unwrap();
        assert_eq!(user.budget(), 1000.0);
    }

    #[test]
    fn add_category_is_idempotent_and_rejects_blank_names() {
        let mut user = User::new(5, "Ana", "ana@x.com", "pw1", Role::User);
        let before = user.categories().len();
        assert_eq!(user.add_category("  Mascotas "), Ok(true));
        assert_eq!(user.add_category("Mascotas"), Ok(false));
        assert_eq!(user.categories().len(), before + 1);
        assert_eq!(user.categories().last().map(String::as_str), Some("Mascotas"));
        assert!(matches!(
            user.add_category("   "),
            Err(FinanceError::InvalidCategory(_))
        ));
    }

    #[test]
    fn from_data_coerces_nested_amounts_and_fills_categories() {
        let record: UserRecord = serde_json::from_value(json!({
            "id": 9,
            "name": "Luis",
            "email": "luis@x.com",
            "password": "pw",
            "role": "user",
            "budget": "750",
            "transactions": [
                {"id": 1, "amount": "100", "type": "income", "category": "Salario", "date": "2024-01-01", "description": ""},
                {"id": 2, "amount": 40, "type": "expense", "category": "Ocio", "date": "2024-01-03", "description": "cine"}
            ],
            "categories": []
        }))
        .unwrap();
        let user = User::from_data(record);
        assert_eq!(user.budget(), 750.0);
        assert_eq!(user.balance(), 60.0);
        assert_eq!(user.categories(), default_categories().as_slice());
        // Categories missing from the vocabulary stay attributable.
        assert_eq!(user.transactions()[1].category(), "Ocio");
    }

    #[test]
    fn from_data_skips_unreadable_transactions() {
        let record: UserRecord = serde_json::from_value(json!({
            "id": 9,
            "email": "luis@x.com",
            "password": "pw",
            "transactions": [
                {"id": 1, "amount": "abc", "type": "income", "category": "Salario", "date": "2024-01-01"},
                {"id": 2, "amount": 40, "type": "expense", "category": "Salud", "date": "2024-01-03"}
            ],
            "categories": ["Salud", "Salud", "Otros"]
        }))
        .unwrap();
        let user = User::from_data(record);
        assert_eq!(user.transaction_count(), 1);
        assert_eq!(user.role(), Role::User);
        assert_eq!(user.categories(), ["Salud".to_string(), "Otros".to_string()]);
    }

    #[test]
    fn record_round_trip_is_lossless() {
        let mut user = User::new(12, "Eva", "eva@x.com", "secret", Role::Admin);
        user.set_budget(1234.56).unwrap();
        user.add_category("Viajes").unwrap();
        user.add_transaction(txn(1, 0.1, TransactionKind::Income, "Salario", 4));
        user.add_transaction(txn(2, 0.2, TransactionKind::Expense, "Viajes", 2));

        let json = serde_json::to_string(&user.to_data()).unwrap();
        let back = User::from_data(serde_json::from_str(&json).unwrap());
        assert_eq!(back, user);

        let direct: User = serde_json::from_str(&serde_json::to_string(&user).unwrap()).unwrap();
        assert_eq!(direct, user);
    }

    #[test]
    fn filtered_transactions_sort_newest_first() {
        let mut user = User::new(5, "Ana", "ana@x.com", "pw1", Role::User);
        user.add_transaction(txn(1, 10.0, TransactionKind::Expense, "Salud", 5));
        user.add_transaction(txn(2, 20.0, TransactionKind::Expense, "Otros", 9));
        user.add_transaction(txn(3, 30.0, TransactionKind::Expense, "Salud", 7));
        user.add_transaction(txn(4, 40.0, TransactionKind::Expense, "Salud", 1));

        let filter = TransactionFilter::new()
            .since(date(2024, 1, 2))
            .until(date(2024, 1, 7))
            .in_category("Salud");
        let ids: Vec<u64> = user
            .filtered_transactions(&filter)
            .into_iter()
            .map(Transaction::id)
            .collect();
        assert_eq!(ids, vec![3, 1]);

        let all: Vec<u64> = user
            .filtered_transactions(&TransactionFilter::default())
            .into_iter()
            .map(Transaction::id)
            .collect();
        assert_eq!(all, vec![2, 3, 1, 4]);
    }

    #[test]
    fn budget_status_uses_all_time_expense() {
        let mut user = User::new(5, "Ana", "ana@x.com", "pw1", Role::User);
        user.set_budget(100.0).unwrap();
        user.add_transaction(txn(1, 90.0, TransactionKind::Expense, "Salud", 1));
        assert_eq!(user.budget_status().tier, BudgetTier::Warning);
        assert_eq!(user.budget_status_for(10.0).tier, BudgetTier::Normal);
    }
}
