//! Deterministic clock for tests.

use chrono::{DateTime, Utc};
use roundtable_core::clock::Clock;

/// Clock pinned to one instant; every call to `now` reports it.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
