use crate::timer::format::{TimeParts, decompose};

/// Final window in which the one-shot ending alert fires. Kept literal: the
/// alert is suppressed entirely for durations shorter than the window, so a
/// fresh short countdown never starts "already ending".
pub const ALERT_WINDOW_MS: i64 = 6_000;

/// How long the finished display holds before returning to setup.
pub const DEFAULT_FINISH_HOLD_MS: i64 = 3_000;

pub const MAX_SETUP_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CountdownPhase {
    /// Digit-entry mode; no duration committed yet.
    Setup,
    /// A nonzero duration is committed but the clock is not running.
    /// Covers both never-started and paused countdowns.
    Armed,
    Running,
    /// Terminal display hold after reaching zero; auto-returns to Setup.
    Finished,
}

/// Signals produced by one tick, consumed by the presentation layer.
/// `alert` and `finished` are one-shot and distinct from ordinary updates.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct CountdownTick {
    pub changed: bool,
    pub alert: bool,
    pub finished: bool,
}

/// Count-down timer with a digit-entry setup mode. Remaining time is always
/// recomputed from an absolute end epoch. Invalid operations are guarded
/// no-ops rather than errors: a double click or a stale tick must never
/// corrupt the state machine.
#[derive(Debug)]
pub struct Countdown {
    phase: CountdownPhase,
    digits: Vec<u8>,
    end_ms: i64,
    remaining_ms: i64,
    original_ms: i64,
    alert_fired: bool,
    finished_at_ms: i64,
    finish_hold_ms: i64,
}

impl Countdown {
    pub fn new() -> Self {
        Self::with_finish_hold(DEFAULT_FINISH_HOLD_MS)
    }

    pub fn with_finish_hold(finish_hold_ms: i64) -> Self {
        Self {
            phase: CountdownPhase::Setup,
            digits: Vec::with_capacity(MAX_SETUP_DIGITS),
            end_ms: 0,
            remaining_ms: 0,
            original_ms: 0,
            alert_fired: false,
            finished_at_ms: 0,
            finish_hold_ms: finish_hold_ms.max(0),
        }
    }

    /// Return to digit entry, cancelling whatever was in progress.
    pub fn enter_setup(&mut self) {
        self.phase = CountdownPhase::Setup;
        self.digits.clear();
        self.end_ms = 0;
        self.remaining_ms = 0;
        self.original_ms = 0;
        self.alert_fired = false;
        self.finished_at_ms = 0;
    }

    /// Append a digit on the least-significant end. Rejected silently when
    /// not in Setup, at capacity, or out of range.
    pub fn push_digit(&mut self, digit: u8) -> bool {
        if self.phase != CountdownPhase::Setup
            || self.digits.len() >= MAX_SETUP_DIGITS
            || digit > 9
        {
            return false;
        }
        self.digits.push(digit);
        true
    }

    pub fn clear_digits(&mut self) {
        if self.phase == CountdownPhase::Setup {
            self.digits.clear();
        }
    }

    /// Derive the target duration from the entered digits and arm the
    /// countdown. A zero duration (no digits, or all zeros) keeps the engine
    /// in Setup; the digits are consumed either way.
    pub fn commit(&mut self) -> bool {
        if self.phase != CountdownPhase::Setup {
            return false;
        }
        let duration_ms = duration_from_digits(&self.digits);
        self.digits.clear();
        self.remaining_ms = duration_ms;
        self.original_ms = duration_ms;
        self.alert_fired = false;
        if duration_ms == 0 {
            return false;
        }
        self.phase = CountdownPhase::Armed;
        true
    }

    pub fn toggle(&mut self, now_ms: i64) {
        if self.phase == CountdownPhase::Running {
            self.pause(now_ms);
        } else {
            self.start(now_ms);
        }
    }

    /// Begin or resume counting down. Requires an armed nonzero remainder.
    pub fn start(&mut self, now_ms: i64) -> bool {
        if self.phase != CountdownPhase::Armed || self.remaining_ms <= 0 {
            return false;
        }
        self.end_ms = now_ms + self.remaining_ms;
        self.phase = CountdownPhase::Running;
        true
    }

    /// Freeze the remainder at `now`. No-op unless running.
    pub fn pause(&mut self, now_ms: i64) -> bool {
        if self.phase != CountdownPhase::Running {
            return false;
        }
        self.remaining_ms = (self.end_ms - now_ms).max(0);
        self.phase = CountdownPhase::Armed;
        true
    }

    /// Equivalent to `enter_setup`. The caller is responsible for silencing
    /// any active alert sound; the engine itself performs no I/O.
    pub fn reset(&mut self) {
        self.enter_setup();
    }

    /// Periodic tick. While running, recomputes the remainder and raises the
    /// one-shot ending alert and the terminal finish signal. While finished,
    /// returns to Setup once the display hold expires.
    pub fn advance(&mut self, now_ms: i64) -> CountdownTick {
        let mut tick = CountdownTick::default();
        match self.phase {
            CountdownPhase::Running => {
                self.remaining_ms = (self.end_ms - now_ms).max(0);
                tick.changed = true;
                if self.remaining_ms == 0 {
                    self.finish(now_ms);
                    tick.finished = true;
                } else if self.remaining_ms <= ALERT_WINDOW_MS
                    && self.original_ms >= ALERT_WINDOW_MS
                    && !self.alert_fired
                {
                    self.alert_fired = true;
                    tick.alert = true;
                }
            }
            CountdownPhase::Finished => {
                if now_ms - self.finished_at_ms >= self.finish_hold_ms {
                    self.enter_setup();
                    tick.changed = true;
                }
            }
            CountdownPhase::Setup | CountdownPhase::Armed => {}
        }
        tick
    }

    fn finish(&mut self, now_ms: i64) {
        self.remaining_ms = 0;
        self.alert_fired = false;
        self.finished_at_ms = now_ms;
        self.phase = CountdownPhase::Finished;
    }

    pub fn phase(&self) -> CountdownPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == CountdownPhase::Running
    }

    pub fn in_setup(&self) -> bool {
        self.phase == CountdownPhase::Setup
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms.max(0) as u64
    }

    pub fn original_ms(&self) -> u64 {
        self.original_ms.max(0) as u64
    }

    pub fn alert_fired(&self) -> bool {
        self.alert_fired
    }

    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    /// Remaining time is inside the final alert window (drives the "ending"
    /// visual treatment, independent of whether the audio alert fired).
    pub fn in_ending_window(&self) -> bool {
        match self.phase {
            CountdownPhase::Running => self.remaining_ms <= ALERT_WINDOW_MS,
            CountdownPhase::Finished => true,
            _ => false,
        }
    }

    /// Display fields for the current state: the right-aligned digit template
    /// during Setup, the decomposed remainder otherwise.
    pub fn display_parts(&self) -> TimeParts {
        if self.phase == CountdownPhase::Setup {
            setup_parts(&self.digits)
        } else {
            decompose(self.remaining_ms())
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Right-align up to six digits into an HHMMSS template, with missing
/// leading positions treated as zero, and combine into milliseconds.
fn duration_from_digits(digits: &[u8]) -> i64 {
    let mut template = [0_u8; MAX_SETUP_DIGITS];
    let offset = MAX_SETUP_DIGITS - digits.len().min(MAX_SETUP_DIGITS);
    for (slot, digit) in template[offset..].iter_mut().zip(digits) {
        *slot = *digit;
    }
    let hours = i64::from(template[0]) * 10 + i64::from(template[1]);
    let minutes = i64::from(template[2]) * 10 + i64::from(template[3]);
    let seconds = i64::from(template[4]) * 10 + i64::from(template[5]);
    hours * 3_600_000 + minutes * 60_000 + seconds * 1_000
}

fn setup_parts(digits: &[u8]) -> TimeParts {
    let mut template = [0_u8; MAX_SETUP_DIGITS];
    let offset = MAX_SETUP_DIGITS - digits.len().min(MAX_SETUP_DIGITS);
    for (slot, digit) in template[offset..].iter_mut().zip(digits) {
        *slot = *digit;
    }
    TimeParts {
        hours: u64::from(template[0]) * 10 + u64::from(template[1]),
        minutes: u64::from(template[2]) * 10 + u64::from(template[3]),
        seconds: u64::from(template[4]) * 10 + u64::from(template[5]),
        centis: 0,
    }
}
