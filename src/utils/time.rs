use chrono::{DateTime, NaiveDate, Utc};

/// Clock abstracts access to the current timestamp so id generation stays
/// deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current UTC date. Defaults to `now().date_naive()`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Milliseconds since the Unix epoch, clamped at zero.
    fn now_millis(&self) -> u64 {
        u64::try_from(self.now().timestamp_millis()).unwrap_or(0)
    }
}

/// Wall-clock implementation backed by [`Utc::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Returns a timestamp-derived id that is strictly greater than every id in
/// `existing`.
pub fn next_id<I>(clock: &dyn Clock, existing: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let floor = existing.into_iter().max().map_or(0, |max| max.saturating_add(1));
    clock.now_millis().max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pinned() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn next_id_uses_clock_when_ahead_of_existing() {
        let clock = pinned();
        assert_eq!(next_id(&clock, [1, 2, 3]), clock.now_millis());
    }

    #[test]
    fn next_id_bumps_past_collisions() {
        let clock = pinned();
        let now = clock.now_millis();
        assert_eq!(next_id(&clock, [now]), now + 1);
        assert_eq!(next_id(&clock, [now, now + 7]), now + 8);
    }
}
