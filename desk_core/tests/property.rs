use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use desk_core::mocks::{ManualClock, RecordingSink};
use desk_core::{DeskPosition, Height, MoveCfg, MoveSession, MoveStatus};
use proptest::prelude::*;

const STOP: [u8; 2] = [0xFF, 0x00];

proptest! {
    /// Every representable (position, speed) pair survives the wire layout.
    #[test]
    fn codec_roundtrips_all_raw_pairs(raw_position: u16, raw_speed: i16) {
        let pos = DeskPosition::new(raw_position, raw_speed);
        let decoded = DeskPosition::decode(&pos.to_payload()).unwrap();
        prop_assert_eq!(decoded, pos);
    }

    /// Trailing bytes beyond the 4-byte layout never change the result.
    #[test]
    fn decode_ignores_trailing_bytes(raw_position: u16, raw_speed: i16, extra in proptest::collection::vec(any::<u8>(), 0..8)) {
        let pos = DeskPosition::new(raw_position, raw_speed);
        let mut payload = pos.to_payload().to_vec();
        payload.extend(extra);
        prop_assert_eq!(DeskPosition::decode(&payload).unwrap(), pos);
    }

    /// A monotone climb always ends in exactly one Stop, placed last, with
    /// the final height no more than one landing offset short of the target.
    #[test]
    fn climbs_terminate_with_exactly_one_stop(
        step_raw in 60u16..400,
        target_offset_tmm in 300i32..2000,
    ) {
        let clock = ManualClock::new();
        let sink = RecordingSink::new();
        let cancel = Arc::new(AtomicBool::new(false));
        let start_raw: u16 = 1778;
        let start = DeskPosition::new(start_raw, 0).height();
        let target = Height::from_tmm(start.as_tmm() + target_offset_tmm);

        let mut session = MoveSession::new(
            Arc::new(Mutex::new(sink.clone())),
            &MoveCfg::default(),
            Arc::new(clock.clone()),
            target,
            cancel,
        ).unwrap();

        let mut status = session.start(start).unwrap();
        prop_assert_eq!(status, MoveStatus::Moving);

        let mut raw = start_raw;
        for _ in 0..200 {
            clock.advance(Duration::from_millis(600));
            raw = raw.saturating_add(step_raw);
            status = session.step(DeskPosition::new(raw, 100)).unwrap();
            if status.is_terminal() {
                break;
            }
        }

        prop_assert_eq!(status, MoveStatus::Arrived);
        let frames = sink.frames();
        prop_assert!(frames.len() >= 2);
        prop_assert_eq!(*frames.last().unwrap(), STOP);
        prop_assert_eq!(frames.iter().filter(|f| **f == STOP).count(), 1);

        // Landing-offset bound: the session never stops further below the
        // target than the coast compensation.
        let final_tmm = session.last_height().as_tmm();
        prop_assert!(final_tmm >= target.as_tmm() - 50);
    }

    /// Moving to the height the desk is already at never issues a command.
    #[test]
    fn equal_target_issues_zero_commands(start_raw: u16) {
        let sink = RecordingSink::new();
        let start = DeskPosition::new(start_raw, 0).height();
        let mut session = MoveSession::new(
            Arc::new(Mutex::new(sink.clone())),
            &MoveCfg::default(),
            Arc::new(ManualClock::new()),
            start,
            Arc::new(AtomicBool::new(false)),
        ).unwrap();

        prop_assert_eq!(session.start(start).unwrap(), MoveStatus::AlreadyAtTarget);
        prop_assert!(sink.frames().is_empty());
    }
}
