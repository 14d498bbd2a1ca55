//! Administrator aggregates and the CSV summary export.

use std::path::Path;

use serde::Serialize;

use crate::{
    errors::{FinanceError, Result},
    ledger::{BudgetStatus, Role, User},
};

pub const CSV_HEADER: [&str; 8] = [
    "Usuario",
    "Email",
    "Rol",
    "Balance Total",
    "Transacciones Totales",
    "Gastos Totales",
    "Presupuesto",
    "Estado",
];
pub const STATUS_OK: &str = "OK";
pub const STATUS_OVER_BUDGET: &str = "SOBREPRESUPUESTO";

/// Per-user figures shown on the administrator dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAggregate {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub balance: f64,
    pub total_income: f64,
    pub total_expense: f64,
    pub transaction_count: usize,
    pub budget: f64,
    pub budget_status: BudgetStatus,
    /// Regular user whose all-time expenses are above a non-zero budget.
    pub budget_alert: bool,
}

impl UserAggregate {
    pub fn from_user(user: &User) -> Self {
        let total_expense = user.total_expense();
        Self {
            id: user.id(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            role: user.role(),
            balance: user.balance(),
            total_income: user.total_income(),
            total_expense,
            transaction_count: user.transaction_count(),
            budget: user.budget(),
            budget_status: user.budget_status_for(total_expense),
            budget_alert: user.role() == Role::User && over_budget(user.budget(), total_expense),
        }
    }
}

/// System-wide totals across the roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminOverview {
    pub total_users: usize,
    pub system_balance: f64,
    pub budget_alerts: usize,
    pub users: Vec<UserAggregate>,
}

impl AdminOverview {
    pub fn from_users(users: &[User]) -> Self {
        let users: Vec<UserAggregate> = users.iter().map(UserAggregate::from_user).collect();
        Self {
            total_users: users.len(),
            system_balance: users.iter().map(|row| row.balance).sum(),
            budget_alerts: users.iter().filter(|row| row.budget_alert).count(),
            users,
        }
    }
}

fn over_budget(budget: f64, total_expense: f64) -> bool {
    budget > 0.0 && total_expense > budget
}

fn money(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    // Amounts that round to zero print without a sign.
    match formatted.strip_prefix('-') {
        Some(magnitude) if magnitude == "0.00" => magnitude.to_string(),
        _ => formatted,
    }
}

/// Renders one CSV row per user. `Estado` flags any user, admins included,
/// whose expenses exceed a non-zero budget.
pub fn admin_csv(users: &[User]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for user in users {
        let total_expense = user.total_expense();
        let status = if over_budget(user.budget(), total_expense) {
            STATUS_OVER_BUDGET
        } else {
            STATUS_OK
        };
        writer.write_record([
            user.name().to_string(),
            user.email().to_string(),
            user.role().to_string(),
            money(user.balance()),
            user.transaction_count().to_string(),
            money(total_expense),
            money(user.budget()),
            status.to_string(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| FinanceError::Report(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| FinanceError::Report(err.to_string()))
}

/// Writes [`admin_csv`] output to `path`.
pub fn write_admin_csv(path: &Path, users: &[User]) -> Result<()> {
    let csv = admin_csv(users)?;
    std::fs::write(path, csv)?;
    Ok(())
}
