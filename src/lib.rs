#![doc(test(attr(deny(warnings))))]

//! Finanzas Core keeps per-user income and expense ledgers, budgets and
//! categories behind a single session authority, persisted through a
//! pluggable key-value store.

pub mod config;
pub mod errors;
pub mod ledger;
pub mod report;
pub mod session;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use errors::{FinanceError, Result};
pub use session::SessionAuthority;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    init_with_config(&config::Config::default());
}

/// Like [`init`], additionally honouring the config's `log_filter` directive.
pub fn init_with_config(config: &config::Config) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(config.log_filter.as_deref());
        tracing::info!("Finanzas Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
