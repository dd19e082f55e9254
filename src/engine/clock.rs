//! Frame timing: wall-clock seconds between ticks.

use std::time::Instant;

/// Source of timestamps for the tick loop.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Measures wall-clock seconds between consecutive ticks.
#[derive(Debug)]
pub struct FrameTimer<C: Clock = SystemClock> {
    clock: C,
    last: Option<Instant>,
}

impl<C: Clock> FrameTimer<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, last: None }
    }

    /// Seconds since the previous call; the first call returns 0.
    pub fn tick(&mut self) -> f64 {
        let now = self.clock.now();
        let elapsed = self
            .last
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f64());
        self.last = Some(now);
        elapsed
    }

    /// Forgets the previous tick so time spent outside the loop is not counted.
    pub fn restart(&mut self) {
        self.last = None;
    }
}
