pub mod time;

use std::sync::Once;

pub use time::{Clock, FixedClock, SystemClock};

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "finanzas_core=info";

/// Initializes the global tracing subscriber with sensible defaults.
///
/// `extra` accepts an additional filter directive (for example the `log_filter`
/// value from [`crate::config::Config`]); invalid directives are ignored.
pub fn init_tracing(extra: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        for raw in std::iter::once(DEFAULT_DIRECTIVE).chain(extra) {
            if let Ok(directive) = raw.parse() {
                filter = filter.add_directive(directive);
            }
        }

        // A host application may already own the global subscriber.
        let _ = fmt().with_env_filter(filter).try_init();
    });
}
