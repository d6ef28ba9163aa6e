use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};

use crate::clock::{SystemClock, TimeSource};
use crate::timer::format::decompose;
use crate::timer::stopwatch::Stopwatch;

pub struct TickStats {
    total_ticks: u64,
    late_ticks: u64,
    last_tick: Duration,
    target_tick: Duration,
    window: VecDeque<Duration>,
}

impl TickStats {
    pub fn new(window_size: usize, target_tick: Duration) -> Self {
        Self {
            total_ticks: 0,
            late_ticks: 0,
            last_tick: Duration::ZERO,
            target_tick,
            window: VecDeque::with_capacity(window_size),
        }
    }

    pub fn record_tick(&mut self, tick_time: Duration) {
        self.total_ticks += 1;
        self.last_tick = tick_time;
        if tick_time > self.target_tick {
            self.late_ticks += 1;
        }
        if self.window.len() == self.window.capacity() {
            let _ = self.window.pop_front();
        }
        self.window.push_back(tick_time);
    }

    pub fn instant_rate(&self) -> f64 {
        if self.last_tick.is_zero() {
            return 0.0;
        }
        1.0 / self.last_tick.as_secs_f64()
    }

    pub fn rolling_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let total_secs: f64 = self.window.iter().map(Duration::as_secs_f64).sum();
        if total_secs == 0.0 {
            return 0.0;
        }
        self.window.len() as f64 / total_secs
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn late_ticks(&self) -> u64 {
        self.late_ticks
    }
}

const BENCH_DURATION: Duration = Duration::from_secs(2);

/// Headless pacing check: drive a live stopwatch at the configured tick
/// interval for a couple of seconds and report how the scheduler kept up.
pub fn run_diagnostics(tick_interval_ms: u64) -> Result<()> {
    if tick_interval_ms == 0 {
        bail!("tick interval must be greater than zero");
    }
    let target = Duration::from_millis(tick_interval_ms);
    println!("stopclock diagnostics");
    println!("Tick interval: {tick_interval_ms} ms");

    let clock = SystemClock;
    let mut watch = Stopwatch::new();
    let mut stats = TickStats::new(512, target);

    watch.start(clock.now_ms());
    let bench_start = Instant::now();
    let bench_end = bench_start + BENCH_DURATION;
    let mut next_tick = bench_start + target;
    while Instant::now() < bench_end {
        let tick_start = Instant::now();
        watch.advance(clock.now_ms());
        sleep_until(next_tick);
        stats.record_tick(tick_start.elapsed());
        next_tick += target;
    }
    watch.stop(clock.now_ms());

    let elapsed = watch.elapsed_ms();
    println!("Benchmark summary:");
    println!("  Ticks: {}", stats.total_ticks());
    println!("  Late ticks: {}", stats.late_ticks());
    println!("  Instant rate: {:.1} ticks/s", stats.instant_rate());
    println!("  Rolling rate: {:.1} ticks/s", stats.rolling_rate());
    println!(
        "  Stopwatch elapsed: {} ms ({})",
        elapsed,
        decompose(elapsed).clock_text()
    );

    let drift = elapsed.abs_diff(BENCH_DURATION.as_millis() as u64);
    if drift > 500 {
        bail!("stopwatch drifted {drift} ms over a {BENCH_DURATION:?} benchmark");
    }
    Ok(())
}

pub fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if now >= deadline {
        return;
    }

    let mut remaining = deadline.saturating_duration_since(now);
    if remaining > Duration::from_millis(1) {
        std::thread::sleep(remaining - Duration::from_micros(250));
    }

    loop {
        let current = Instant::now();
        if current >= deadline {
            break;
        }
        remaining = deadline.saturating_duration_since(current);
        if remaining > Duration::from_micros(50) {
            std::thread::yield_now();
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_ticks_are_counted_against_the_target() {
        let mut stats = TickStats::new(8, Duration::from_millis(10));
        stats.record_tick(Duration::from_millis(5));
        stats.record_tick(Duration::from_millis(25));
        assert_eq!(stats.total_ticks(), 2);
        assert_eq!(stats.late_ticks(), 1);
    }

    #[test]
    fn rolling_rate_reflects_the_window() {
        let mut stats = TickStats::new(4, Duration::from_millis(10));
        for _ in 0..4 {
            stats.record_tick(Duration::from_millis(10));
        }
        let rate = stats.rolling_rate();
        assert!((rate - 100.0).abs() < 1.0, "rate was {rate}");
    }

    #[test]
    fn sleep_until_past_deadline_returns_immediately() {
        let before = Instant::now();
        sleep_until(before);
        assert!(before.elapsed() < Duration::from_millis(5));
    }
}
