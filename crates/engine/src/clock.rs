//! Clock implementations for `turnforge_ports::ClockPort`.

use chrono::{DateTime, Utc};
use turnforge_ports::ClockPort;

/// System clock - uses real time. Injected into `TurnPipeline`/
/// `CombatManager` by the session host; the core never calls
/// `Utc::now()` itself (spec §8 reproducibility).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock for deterministic tests and replay.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
