//! Input-idle reporting.
//!
//! The OS input-idle source (keyboard/pointer event age) is an external
//! collaborator; the scheduler only consumes a duration. These
//! implementations cover headless use and hosts that feed activity in
//! explicitly.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use desk_traits::IdleMonitor;

/// Treats the user as permanently present. For headless deployments with no
/// input telemetry, where the activity gate should never block.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysActive;

impl IdleMonitor for AlwaysActive {
    fn idle_time(&self) -> Duration {
        Duration::ZERO
    }
}

/// Idle monitor fed by explicit activity pings from the host application.
/// Clones share the same underlying timestamp.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    last_activity: Arc<Mutex<Instant>>,
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            last_activity: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Record user activity now.
    pub fn touch(&self) {
        if let Ok(mut last) = self.last_activity.lock() {
            *last = Instant::now();
        }
    }
}

impl IdleMonitor for ActivityTracker {
    fn idle_time(&self) -> Duration {
        self.last_activity
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_active_reports_zero_idle() {
        assert_eq!(AlwaysActive.idle_time(), Duration::ZERO);
    }

    #[test]
    fn touch_resets_idle_time() {
        let tracker = ActivityTracker::new();
        std::thread::sleep(Duration::from_millis(20));
        assert!(tracker.idle_time() >= Duration::from_millis(20));

        tracker.touch();
        assert!(tracker.idle_time() < Duration::from_millis(20));
    }

    #[test]
    fn clones_share_the_timestamp() {
        let tracker = ActivityTracker::new();
        let clone = tracker.clone();
        std::thread::sleep(Duration::from_millis(20));
        clone.touch();
        assert!(tracker.idle_time() < Duration::from_millis(20));
    }
}
