#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StopwatchPhase {
    Idle,
    Running,
    Paused,
}

/// Count-up timer. Elapsed time is always recomputed from an absolute start
/// epoch, never accumulated from per-tick deltas, so display granularity has
/// no effect on accuracy. Every transition is a guarded no-op when invalid;
/// a stale tick after reset cannot resurrect the timer.
#[derive(Debug)]
pub struct Stopwatch {
    running: bool,
    start_ms: i64,
    elapsed_ms: i64,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            running: false,
            start_ms: 0,
            elapsed_ms: 0,
        }
    }

    /// Start or resume. Anchors the start epoch at `now - elapsed` so
    /// accumulated time carries across pauses. No-op while running.
    pub fn start(&mut self, now_ms: i64) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.start_ms = now_ms - self.elapsed_ms;
        true
    }

    /// Freeze elapsed time at `now`. No-op unless running.
    pub fn stop(&mut self, now_ms: i64) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.elapsed_ms = (now_ms - self.start_ms).max(0);
        true
    }

    /// Valid from any state.
    pub fn reset(&mut self) {
        self.running = false;
        self.start_ms = 0;
        self.elapsed_ms = 0;
    }

    /// Periodic tick. Returns whether observable state changed.
    pub fn advance(&mut self, now_ms: i64) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed_ms = (now_ms - self.start_ms).max(0);
        true
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms.max(0) as u64
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> StopwatchPhase {
        if self.running {
            StopwatchPhase::Running
        } else if self.elapsed_ms > 0 {
            StopwatchPhase::Paused
        } else {
            StopwatchPhase::Idle
        }
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
