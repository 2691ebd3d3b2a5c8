//! Local wall-clock backed by chrono.

use chrono::{Local, Timelike};
use desk_traits::clock::{WallClock, WallTime};

/// Reads the system's local time of day.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallClock;

impl SystemWallClock {
    pub fn new() -> Self {
        Self
    }
}

impl WallClock for SystemWallClock {
    fn now(&self) -> WallTime {
        let now = Local::now();
        WallTime {
            hour: now.hour(),
            minute: now.minute(),
            second: now.second(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_in_range_components() {
        let t = SystemWallClock::new().now();
        assert!(t.hour < 24);
        assert!(t.minute < 60);
        assert!(t.second < 61);
    }
}
