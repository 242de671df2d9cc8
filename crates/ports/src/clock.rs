//! Wall-clock capability (spec §8 reproducibility): `Event` construction
//! needs a timestamp, but the engine core never calls `Utc::now()`
//! itself - the caller injects a clock the same way it injects a seeded
//! `Dice`, so tests and replayed runs can pin the value.

use chrono::{DateTime, Utc};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
