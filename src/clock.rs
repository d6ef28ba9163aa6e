#[cfg(test)]
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Local;

/// Source of the wall-clock milliseconds the engines are advanced against.
/// Engines take `now_ms` explicitly per call; this seam only decides where
/// that value comes from, so any scheduler (real timer, test, benchmark)
/// can drive them.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

/// Deterministic clock for tests.
#[cfg(test)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::Relaxed);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::Relaxed);
    }
}

#[cfg(test)]
impl TimeSource for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn system_clock_is_monotonic_over_a_short_sleep() {
        let clock = SystemClock;
        let first = clock.now_ms();
        thread::sleep(Duration::from_millis(2));
        let second = clock.now_ms();
        assert!(second >= first);
    }

    #[test]
    fn manual_clock_advances_on_demand() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance(250);
        assert_eq!(clock.now_ms(), 1_250);
        clock.set(9_000);
        assert_eq!(clock.now_ms(), 9_000);
    }
}
