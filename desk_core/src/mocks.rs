//! Test and helper mocks for desk_core

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use desk_traits::clock::Clock;
use desk_traits::{IdleMonitor, MoveSink};

/// Records every written command frame.
#[derive(Clone, Default)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<[u8; 2]>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<[u8; 2]> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl MoveSink for RecordingSink {
    fn write(&mut self, frame: [u8; 2]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(frame);
        }
        Ok(())
    }
}

/// Deterministic manually-advanced clock for control-loop tests.
///
/// now() = origin + offset; sleep(d) advances internal time by d without
/// actually sleeping.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
        self.origin + off
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

/// Reports a fixed input idle time.
#[derive(Debug, Clone, Copy)]
pub struct FixedIdleMonitor(Duration);

impl FixedIdleMonitor {
    pub fn new(idle: Duration) -> Self {
        Self(idle)
    }
}

impl IdleMonitor for FixedIdleMonitor {
    fn idle_time(&self) -> Duration {
        self.0
    }
}
