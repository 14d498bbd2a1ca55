use serde::{Deserialize, Serialize};

/// Utilisation (in percent) at which spending starts to warrant a warning.
pub const WARNING_PERCENT: f64 = 80.0;
/// Utilisation (in percent) at which the budget counts as exhausted.
pub const EXCEEDED_PERCENT: f64 = 100.0;

/// Classification of expense-to-budget utilisation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    /// No budget has been set.
    Unset,
    Normal,
    Warning,
    Exceeded,
}

/// Outcome of classifying an expense total against a budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BudgetStatus {
    pub tier: BudgetTier,
    /// Raw `expense / budget`; may exceed `1.0`. `None` when no budget is set.
    pub ratio: Option<f64>,
    /// Utilisation in percent, capped at 100 for display.
    pub percentage: f64,
}

impl BudgetStatus {
    /// Classifies `total_expense` against `budget` using the fixed 80/100
    /// thresholds. A budget of zero (or less) is treated as unset.
    pub fn classify(budget: f64, total_expense: f64) -> Self {
        if budget.is_nan() || budget <= 0.0 {
            return Self {
                tier: BudgetTier::Unset,
                ratio: None,
                percentage: 0.0,
            };
        }
        let ratio = total_expense / budget;
        let percentage = (total_expense * 100.0 / budget).min(EXCEEDED_PERCENT);
        let tier = if percentage >= EXCEEDED_PERCENT {
            BudgetTier::Exceeded
        } else if percentage >= WARNING_PERCENT {
            BudgetTier::Warning
        } else {
            BudgetTier::Normal
        };
        Self {
            tier,
            ratio: Some(ratio),
            percentage,
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.ratio.is_some_and(|ratio| ratio > 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_unset() {
        let status = BudgetStatus::classify(0.0, 500.0);
        assert_eq!(status.tier, BudgetTier::Unset);
        assert_eq!(status.ratio, None);
        assert_eq!(status.percentage, 0.0);
    }

    #[test]
    fn thresholds_split_tiers() {
        assert_eq!(BudgetStatus::classify(1000.0, 0.0).tier, BudgetTier::Normal);
        assert_eq!(BudgetStatus::classify(1000.0, 799.99).tier, BudgetTier::Normal);
        assert_eq!(BudgetStatus::classify(1000.0, 800.0).tier, BudgetTier::Warning);
        assert_eq!(BudgetStatus::classify(1000.0, 999.99).tier, BudgetTier::Warning);
        assert_eq!(BudgetStatus::classify(1000.0, 1000.0).tier, BudgetTier::Exceeded);
    }

    #[test]
    fn percentage_is_capped_but_ratio_is_not() {
        let status = BudgetStatus::classify(1000.0, 1050.0);
        assert_eq!(status.tier, BudgetTier::Exceeded);
        assert_eq!(status.percentage, 100.0);
        assert_eq!(status.ratio, Some(1.05));
        assert!(status.is_over_budget());
    }

    #[test]
    fn exactly_at_budget_is_exceeded_but_not_over() {
        let status = BudgetStatus::classify(500.0, 500.0);
        assert_eq!(status.tier, BudgetTier::Exceeded);
        assert!(!status.is_over_budget());
    }
}
