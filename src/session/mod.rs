//! Ownership of the user roster and the active session.
//!
//! [`SessionAuthority`] is constructed once per process with an injected
//! [`KeyValueStore`] and handed to consumers by reference. Every mutation
//! rewrites the whole roster under [`USERS_KEY`]; when two processes share one
//! store the last writer wins at roster granularity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    errors::{FinanceError, Result},
    ledger::{Role, Transaction, TransactionKind, User, UserSummary},
    report::{self, AdminOverview},
    storage::{KeyValueStore, SESSION_KEY, USERS_KEY},
    utils::time::{next_id, Clock, SystemClock},
};

/// Identity of the administrator seeded into an empty roster.
pub const SEED_ADMIN_ID: u64 = 1;
pub const SEED_ADMIN_NAME: &str = "Admin";
pub const SEED_ADMIN_EMAIL: &str = "admin@finanzas.com";
pub const SEED_ADMIN_PASSWORD: &str = "admin123";

/// Mediates every read and write of user data so the roster and the session
/// copy never diverge after a successful operation.
pub struct SessionAuthority {
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    roster: Vec<User>,
    /// Stored roster records that could not be decoded. They are written back
    /// untouched on every roster save so a bad field never deletes an account.
    unreadable: Vec<Value>,
    session: Option<User>,
}

impl SessionAuthority {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Box::new(SystemClock))
    }

    /// Loads the roster and any persisted session from `store`, seeding the
    /// administrator when the roster key is absent or does not hold an array.
    ///
    /// A persisted session is trusted as-is; credentials are not re-checked.
    pub fn with_clock(store: Box<dyn KeyValueStore>, clock: Box<dyn Clock>) -> Self {
        let mut authority = Self {
            store,
            clock,
            roster: Vec::new(),
            unreadable: Vec::new(),
            session: None,
        };

        match read_roster(authority.store.as_ref()) {
            Some(stored) => {
                debug!(
                    users = stored.users.len(),
                    unreadable = stored.unreadable.len(),
                    "loaded roster"
                );
                authority.roster = stored.users;
                authority.unreadable = stored.unreadable;
            }
            None => {
                info!(email = SEED_ADMIN_EMAIL, "seeding administrator into missing roster");
                authority.roster = vec![seed_admin()];
                authority.persist_roster();
            }
        }

        if let Some(value) = authority.store.get(SESSION_KEY) {
            match serde_json::from_value::<User>(value) {
                Ok(user) => {
                    debug!(user = user.id(), "restored persisted session");
                    authority.session = Some(user);
                }
                Err(err) => warn!(error = %err, "ignoring unreadable session record"),
            }
        }

        authority
    }

    /// Adds a new user with role `user`. Does not open a session.
    pub fn register(&mut self, name: &str, email: &str, password: &str) -> Result<UserSummary> {
        let taken = self.roster.iter().any(|user| user.email() == email)
            || self
                .unreadable
                .iter()
                .any(|record| record.get("email").and_then(Value::as_str) == Some(email));
        if taken {
            return Err(FinanceError::DuplicateEmail(email.to_string()));
        }
        let existing = self
            .roster
            .iter()
            .map(User::id)
            .chain(self.unreadable.iter().filter_map(|record| record.get("id")?.as_u64()));
        let id = next_id(self.clock.as_ref(), existing);
        let user = User::new(id, name, email, password, Role::User);
        let summary = user.summary();
        self.roster.push(user);
        self.persist_roster();
        info!(user = id, email, "registered user");
        Ok(summary)
    }

    /// Opens a session for the single roster user matching both fields exactly.
    /// On failure the current session is left untouched.
    pub fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let mut matches = self
            .roster
            .iter()
            .filter(|user| user.email() == email && user.password() == password);
        let user = match (matches.next(), matches.next()) {
            (Some(user), None) => user.clone(),
            _ => {
                info!(email, "rejected login");
                return Err(FinanceError::InvalidCredentials);
            }
        };
        self.persist_session(&user);
        info!(user = user.id(), "logged in");
        self.session = Some(user.clone());
        Ok(user)
    }

    /// Clears the session. Safe to call when nobody is logged in.
    pub fn logout(&mut self) {
        if let Some(user) = self.session.take() {
            info!(user = user.id(), "logged out");
        }
        self.store.remove(SESSION_KEY);
    }

    /// Replaces the roster entry with the same id by `user` in full and, when it
    /// is the session's user, the session copy too.
    ///
    /// Returns `false` (and changes nothing) when no roster entry has that id.
    pub fn update_user(&mut self, user: User) -> bool {
        let Some(index) = self.roster.iter().position(|entry| entry.id() == user.id()) else {
            warn!(user = user.id(), "ignoring update for unknown user");
            return false;
        };
        self.roster[index] = user.clone();
        self.persist_roster();

        if self
            .session
            .as_ref()
            .is_some_and(|current| current.id() == user.id())
        {
            self.persist_session(&user);
            self.session = Some(user);
        }
        true
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(User::is_admin)
    }

    /// In-memory roster used for login, registration and updates.
    pub fn roster(&self) -> &[User] {
        &self.roster
    }

    pub fn user(&self, id: u64) -> Option<&User> {
        self.roster.iter().find(|user| user.id() == id)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Fresh read of every user from the store, picking up changes made by
    /// other processes since start-up. Callers are expected to check
    /// [`SessionAuthority::is_admin`] first.
    pub fn list_all_users(&self) -> Vec<User> {
        read_roster(self.store.as_ref())
            .map(|stored| stored.users)
            .unwrap_or_default()
    }

    /// Applies `mutator` to a copy of the session user and commits it through
    /// [`SessionAuthority::update_user`] when it succeeds.
    ///
    /// Fails with [`FinanceError::StaleSession`] when the session user has no
    /// roster entry, in which case nothing is applied or persisted.
    pub fn mutate_current<F, R>(&mut self, mutator: F) -> Result<R>
    where
        F: FnOnce(&mut User) -> Result<R>,
    {
        let mut user = self
            .session
            .clone()
            .ok_or(FinanceError::NotAuthenticated)?;
        let id = user.id();
        let output = mutator(&mut user)?;
        if !self.update_user(user) {
            return Err(FinanceError::StaleSession(id));
        }
        Ok(output)
    }

    /// Records a new entry in the session user's ledger.
    pub fn record_transaction(
        &mut self,
        amount: f64,
        kind: TransactionKind,
        category: &str,
        date: NaiveDate,
        description: &str,
    ) -> Result<Transaction> {
        let current = self.session.as_ref().ok_or(FinanceError::NotAuthenticated)?;
        let id = current.next_transaction_id(self.clock.as_ref());
        let transaction = Transaction::new(id, amount, kind, category, date, description)?;
        self.mutate_current(|user| {
            user.add_transaction(transaction.clone());
            Ok(())
        })?;
        Ok(transaction)
    }

    pub fn set_budget(&mut self, amount: f64) -> Result<()> {
        self.mutate_current(|user| user.set_budget(amount))
    }

    pub fn add_category(&mut self, name: &str) -> Result<bool> {
        self.mutate_current(|user| user.add_category(name))
    }

    /// Aggregates over a fresh read of the roster.
    pub fn admin_overview(&self) -> Result<AdminOverview> {
        self.require_admin()?;
        Ok(AdminOverview::from_users(&self.list_all_users()))
    }

    /// CSV summary of every user, for administrators only.
    pub fn export_admin_report(&self) -> Result<String> {
        self.require_admin()?;
        report::admin_csv(&self.list_all_users())
    }

    fn require_admin(&self) -> Result<()> {
        if !self.is_authenticated() {
            return Err(FinanceError::NotAuthenticated);
        }
        if !self.is_admin() {
            return Err(FinanceError::AdminRequired);
        }
        Ok(())
    }

    fn persist_roster(&self) {
        let mut records = Vec::with_capacity(self.roster.len() + self.unreadable.len());
        for user in &self.roster {
            match serde_json::to_value(user) {
                Ok(record) => records.push(record),
                Err(err) => {
                    error!(
                        user = user.id(),
                        error = %err,
                        "unable to serialize roster, keeping stored copy"
                    );
                    return;
                }
            }
        }
        records.extend(self.unreadable.iter().cloned());
        self.store.save(USERS_KEY, &Value::Array(records));
    }

    fn persist_session(&self, user: &User) {
        self.persist(SESSION_KEY, user);
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => self.store.save(key, &json),
            Err(err) => error!(key, error = %err, "unable to serialize value for store"),
        }
    }
}

fn seed_admin() -> User {
    User::new(
        SEED_ADMIN_ID,
        SEED_ADMIN_NAME,
        SEED_ADMIN_EMAIL,
        SEED_ADMIN_PASSWORD,
        Role::Admin,
    )
}

/// Decoded roster plus the raw records that failed to decode.
struct StoredRoster {
    users: Vec<User>,
    unreadable: Vec<Value>,
}

/// Reads the roster key. `None` when the key is absent or not an array.
fn read_roster(store: &dyn KeyValueStore) -> Option<StoredRoster> {
    let records = match store.get(USERS_KEY)? {
        Value::Array(records) => records,
        other => {
            warn!(kind = json_kind(&other), "stored roster is not an array");
            return None;
        }
    };
    let mut stored = StoredRoster {
        users: Vec::with_capacity(records.len()),
        unreadable: Vec::new(),
    };
    for record in records {
        match User::deserialize(&record) {
            Ok(user) => stored.users.push(user),
            Err(err) => {
                warn!(error = %err, "keeping unreadable user record aside");
                stored.unreadable.push(record);
            }
        }
    }
    Some(stored)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
