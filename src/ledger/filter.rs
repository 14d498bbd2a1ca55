use chrono::NaiveDate;

use super::transaction::Transaction;

/// Display-level narrowing of a user's history. Bounds are inclusive and every
/// criterion is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Exact category label; `None` matches every category.
    pub category: Option<String>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn until(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        let date = transaction.date();
        self.start.map_or(true, |start| date >= start)
            && self.end.map_or(true, |end| date <= end)
            && self
                .category
                .as_deref()
                .map_or(true, |category| transaction.category() == category)
    }
}
