use std::time::Duration;

use desk_ble::SimulatedDesk;
use desk_traits::{MoveSink, PositionSource};
use rstest::rstest;

fn decode(payload: &[u8]) -> (u16, i16) {
    assert!(payload.len() >= 4, "payload too short: {payload:?}");
    (
        u16::from_le_bytes([payload[0], payload[1]]),
        i16::from_le_bytes([payload[2], payload[3]]),
    )
}

#[rstest]
#[case([0x47, 0x00], 1254, 100)]
#[case([0x46, 0x00], 746, -100)]
fn directional_commands_move_and_notify(
    #[case] frame: [u8; 2],
    #[case] expected_raw: u16,
    #[case] expected_speed: i16,
) {
    let (mut source, mut sink) = SimulatedDesk::new(1000);

    sink.write(frame).expect("command accepted");
    let payload = source
        .recv(Duration::from_millis(500))
        .expect("recv")
        .expect("stream open");
    let (raw, speed) = decode(&payload);
    assert_eq!(raw, expected_raw);
    assert_eq!(speed, expected_speed);
}

#[test]
fn stop_reports_zero_speed_without_moving() {
    let (mut source, mut sink) = SimulatedDesk::new(1000);

    sink.write([0x47, 0x00]).expect("up");
    let _ = source.recv(Duration::from_millis(500)).expect("recv");

    sink.write([0xFF, 0x00]).expect("stop");
    // Drain any interval announcements queued before the stop landed.
    let mut last_speed = None;
    for _ in 0..10 {
        let payload = source
            .recv(Duration::from_millis(500))
            .expect("recv")
            .expect("stream open");
        let (_, speed) = decode(&payload);
        last_speed = Some(speed);
        if speed == 0 {
            break;
        }
    }
    assert_eq!(last_speed, Some(0));
}

#[test]
fn unknown_frames_are_rejected() {
    let (_source, mut sink) = SimulatedDesk::new(1000);
    assert!(sink.write([0x00, 0x00]).is_err());
}

#[test]
fn interval_notifier_keeps_announcing_while_moving() {
    let (mut source, mut sink) = SimulatedDesk::new(1000);

    sink.write([0x47, 0x00]).expect("up");
    let first = source
        .recv(Duration::from_millis(500))
        .expect("recv")
        .expect("open");
    // Next announcement comes from the interval notifier, drifting upward.
    let second = source
        .recv(Duration::from_millis(1000))
        .expect("recv")
        .expect("open");
    let (raw1, _) = decode(&first);
    let (raw2, speed2) = decode(&second);
    assert!(raw2 > raw1, "expected drift: {raw1} -> {raw2}");
    assert_eq!(speed2, 100);
}
