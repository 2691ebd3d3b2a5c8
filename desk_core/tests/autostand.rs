//! Scheduler tick behavior: exact-minute matching, the activity gate, and
//! live marker refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use desk_core::AutoStandCfg;
use desk_core::autostand::AutoStand;
use desk_core::mocks::FixedIdleMonitor;
use desk_traits::clock::WallTime;
use rstest::rstest;

struct Counters {
    stands: Arc<AtomicUsize>,
    sits: Arc<AtomicUsize>,
}

fn counting_autostand(cfg: AutoStandCfg, idle: Duration) -> (AutoStand, Counters) {
    let stands = Arc::new(AtomicUsize::new(0));
    let sits = Arc::new(AtomicUsize::new(0));
    let counters = Counters {
        stands: stands.clone(),
        sits: sits.clone(),
    };
    let auto = AutoStand::new(
        move || cfg.clone(),
        FixedIdleMonitor::new(idle),
        move || {
            stands.fetch_add(1, Ordering::SeqCst);
        },
        move || {
            sits.fetch_add(1, Ordering::SeqCst);
        },
    );
    (auto, counters)
}

fn markers(stand: u32, sit: u32) -> AutoStandCfg {
    AutoStandCfg {
        enabled: true,
        stand_minute: stand,
        sit_minute: sit,
        inactivity_timeout_min: 5,
    }
}

#[test]
fn fires_stand_at_the_stand_minute() {
    let (auto, counters) = counting_autostand(markers(10, 15), Duration::ZERO);
    auto.tick(WallTime::hm(10, 10));
    assert_eq!(counters.stands.load(Ordering::SeqCst), 1);
    assert_eq!(counters.sits.load(Ordering::SeqCst), 0);
}

#[test]
fn fires_sit_exactly_once_at_the_sit_minute() {
    let (auto, counters) = counting_autostand(markers(10, 15), Duration::ZERO);
    auto.tick(WallTime::hm(10, 15));
    assert_eq!(counters.stands.load(Ordering::SeqCst), 0);
    assert_eq!(counters.sits.load(Ordering::SeqCst), 1);
}

#[rstest]
#[case(20)]
#[case(0)]
#[case(59)]
fn other_minutes_are_a_no_op(#[case] minute: u32) {
    let (auto, counters) = counting_autostand(markers(10, 15), Duration::ZERO);
    auto.tick(WallTime::hm(10, minute));
    assert_eq!(counters.stands.load(Ordering::SeqCst), 0);
    assert_eq!(counters.sits.load(Ordering::SeqCst), 0);
}

/// Nobody at the computer: the desk must not move.
#[rstest]
#[case(10)]
#[case(15)]
fn inactive_user_suppresses_actions(#[case] minute: u32) {
    let (auto, counters) = counting_autostand(markers(10, 15), Duration::from_secs(10 * 60));
    auto.tick(WallTime::hm(10, minute));
    assert_eq!(counters.stands.load(Ordering::SeqCst), 0);
    assert_eq!(counters.sits.load(Ordering::SeqCst), 0);
}

#[test]
fn disabled_scheduler_never_fires() {
    let cfg = AutoStandCfg {
        enabled: false,
        ..markers(10, 15)
    };
    let (auto, counters) = counting_autostand(cfg, Duration::ZERO);
    auto.tick(WallTime::hm(10, 10));
    auto.tick(WallTime::hm(10, 15));
    assert_eq!(counters.stands.load(Ordering::SeqCst), 0);
    assert_eq!(counters.sits.load(Ordering::SeqCst), 0);
}

#[test]
fn sit_wins_when_markers_share_a_minute() {
    let (auto, counters) = counting_autostand(markers(30, 30), Duration::ZERO);
    auto.tick(WallTime::hm(10, 30));
    assert_eq!(counters.stands.load(Ordering::SeqCst), 0);
    assert_eq!(counters.sits.load(Ordering::SeqCst), 1);
}

/// Markers are re-read from configuration on every tick, so changes take
/// effect at the next boundary.
#[test]
fn marker_changes_apply_on_the_next_tick() {
    let cfg = Arc::new(Mutex::new(markers(10, 15)));
    let stands = Arc::new(AtomicUsize::new(0));
    let stands_ref = stands.clone();
    let cfg_ref = cfg.clone();

    let auto = AutoStand::new(
        move || cfg_ref.lock().unwrap().clone(),
        FixedIdleMonitor::new(Duration::ZERO),
        move || {
            stands_ref.fetch_add(1, Ordering::SeqCst);
        },
        || {},
    );

    auto.tick(WallTime::hm(10, 25));
    assert_eq!(stands.load(Ordering::SeqCst), 0);

    cfg.lock().unwrap().stand_minute = 25;
    auto.tick(WallTime::hm(10, 25));
    assert_eq!(stands.load(Ordering::SeqCst), 1);
}
