//! Time source abstraction. Ported from the harness's `_now()` helper,
//! which returns `frozen_time` when set and the real wall clock otherwise,
//! so a full pipeline run can be replayed with byte-identical outputs.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrozenClock(pub DateTime<Utc>);

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn frozen_clock_always_returns_same_instant() {
        let fixed = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = FrozenClock(fixed);
        assert_eq!(clock.now(), fixed);
        assert_eq!(clock.now(), fixed);
    }
}
