//! Clock-driven automatic stand/sit with a user-activity gate.
//!
//! Ticks fire once per minute, aligned to minute boundaries. An exact match
//! of the current minute against the configured stand/sit markers invokes the
//! corresponding action, but only while the user is active: the desk must
//! not move when nobody is at the computer. Markers are re-read from the
//! configuration supplier on every tick, so changes apply at the next
//! boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use desk_traits::IdleMonitor;
use desk_traits::clock::{Clock, WallClock, WallTime};

use crate::config::AutoStandCfg;

/// The next upcoming stand/sit pair. `sit` is strictly after `stand`, also
/// across an hour rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandSpan {
    pub stand: WallTime,
    pub sit: WallTime,
}

type Action = Box<dyn Fn() + Send + Sync>;

pub struct AutoStand {
    cfg: Box<dyn Fn() -> AutoStandCfg + Send + Sync>,
    idle: Box<dyn IdleMonitor + Send + Sync>,
    stand: Action,
    sit: Action,
}

impl AutoStand {
    /// `cfg` is consulted on every tick and `next_span` query; pass a closure
    /// reading live settings to make marker changes take effect immediately.
    pub fn new(
        cfg: impl Fn() -> AutoStandCfg + Send + Sync + 'static,
        idle: impl IdleMonitor + Send + Sync + 'static,
        stand: impl Fn() + Send + Sync + 'static,
        sit: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            cfg: Box::new(cfg),
            idle: Box::new(idle),
            stand: Box::new(stand),
            sit: Box::new(sit),
        }
    }

    /// Evaluate one minute boundary. Exact-minute match only; the driver must
    /// guarantee at least one tick per minute. When both markers share a
    /// minute, sit wins.
    pub fn tick(&self, now: WallTime) {
        let cfg = (self.cfg)();
        if !cfg.enabled {
            return;
        }

        if now.minute == cfg.sit_minute {
            if self.user_active(&cfg) {
                tracing::debug!(minute = now.minute, "triggering sit");
                (self.sit)();
            } else {
                tracing::debug!("user inactive, skipping automatic sit");
            }
        } else if now.minute == cfg.stand_minute {
            if self.user_active(&cfg) {
                tracing::debug!(minute = now.minute, "triggering stand");
                (self.stand)();
            } else {
                tracing::debug!("user inactive, skipping automatic stand");
            }
        }
    }

    /// Pure query for the next stand/sit pair, or `None` when disabled.
    pub fn next_span(&self, now: WallTime) -> Option<StandSpan> {
        let cfg = (self.cfg)();
        if !cfg.enabled {
            return None;
        }
        let stand = if now.minute < cfg.stand_minute {
            WallTime::hm(now.hour, cfg.stand_minute)
        } else {
            WallTime::hm(now.hour, cfg.stand_minute).add_hours(1)
        };
        // Sit is strictly after stand; equal or earlier markers land in the
        // following hour.
        let sit = if cfg.sit_minute > cfg.stand_minute {
            WallTime::hm(stand.hour, cfg.sit_minute)
        } else {
            WallTime::hm(stand.hour, cfg.sit_minute).add_hours(1)
        };
        Some(StandSpan { stand, sit })
    }

    fn user_active(&self, cfg: &AutoStandCfg) -> bool {
        self.idle.idle_time() < Duration::from_secs(u64::from(cfg.inactivity_timeout_min) * 60)
    }
}

/// Tick driver: sleep to the next minute boundary, then fire every 60 s.
/// Single-threaded, so ticks never overlap; a slow tick only delays the next.
pub fn run_autostand(
    autostand: &AutoStand,
    clock: &Arc<dyn Clock + Send + Sync>,
    wall: &Arc<dyn WallClock + Send + Sync>,
    shutdown: &Arc<AtomicBool>,
) {
    let second = wall.now().second.min(59);
    clock.sleep(Duration::from_secs(u64::from(60 - second)));

    while !shutdown.load(Ordering::Relaxed) {
        autostand.tick(wall.now());
        clock.sleep(Duration::from_secs(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FixedIdleMonitor;

    fn autostand(cfg: AutoStandCfg) -> AutoStand {
        AutoStand::new(
            move || cfg.clone(),
            FixedIdleMonitor::new(Duration::ZERO),
            || {},
            || {},
        )
    }

    #[test]
    fn next_span_rolls_sit_into_the_following_hour() {
        let auto = autostand(AutoStandCfg {
            enabled: true,
            stand_minute: 55,
            sit_minute: 0,
            inactivity_timeout_min: 5,
        });

        let span = auto.next_span(WallTime::hm(10, 58)).unwrap();
        assert_eq!(span.stand, WallTime::hm(11, 55));
        assert_eq!(span.sit, WallTime::hm(12, 0));

        let span = auto.next_span(WallTime::hm(11, 1)).unwrap();
        assert_eq!(span.stand, WallTime::hm(11, 55));
        assert_eq!(span.sit, WallTime::hm(12, 0));
    }

    #[test]
    fn next_span_keeps_later_sit_in_the_same_hour() {
        let auto = autostand(AutoStandCfg {
            enabled: true,
            stand_minute: 10,
            sit_minute: 40,
            inactivity_timeout_min: 5,
        });

        let span = auto.next_span(WallTime::hm(9, 5)).unwrap();
        assert_eq!(span.stand, WallTime::hm(9, 10));
        assert_eq!(span.sit, WallTime::hm(9, 40));
    }

    #[test]
    fn next_span_is_none_when_disabled() {
        let auto = autostand(AutoStandCfg {
            enabled: false,
            ..AutoStandCfg::default()
        });
        assert_eq!(auto.next_span(WallTime::hm(10, 0)), None);
    }
}
