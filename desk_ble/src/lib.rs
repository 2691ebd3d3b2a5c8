//! Platform backends for the `desk_traits` seams.
//!
//! The simulated desk is always available and mimics the actuator's
//! write→notify round trip; the `btleplug`-backed transport lives behind the
//! `ble` feature. Service/characteristic addressing for Linak-style desk
//! controllers is defined here, next to the GATT plumbing that uses it.

#[cfg(feature = "ble")]
pub mod ble;
pub mod error;
pub mod idle;
pub mod wall;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel as xch;
use desk_traits::{MoveSink, PositionSource};
use uuid::Uuid;

use crate::error::LinkError;

/// Position service: readable + notifiable height/speed characteristic.
pub const POSITION_SERVICE_UUID: Uuid = Uuid::from_u128(0x99fa0020_338a_1024_8a49_009c0215f78a);
pub const POSITION_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x99fa0021_338a_1024_8a49_009c0215f78a);

/// Move service: write-only 2-byte command characteristic.
pub const MOVE_SERVICE_UUID: Uuid = Uuid::from_u128(0x99fa0001_338a_1024_8a49_009c0215f78a);
pub const MOVE_CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x99fa0002_338a_1024_8a49_009c0215f78a);

const SIM_SPEED: i16 = 100;
const SIM_NOTIFY_INTERVAL: Duration = Duration::from_millis(150);
/// Raw units (0.1 mm) the simulated actuator drifts per interval while moving.
const SIM_DRIFT_RAW: u16 = 30;
/// Raw units the simulated actuator jumps immediately after a command.
const SIM_STEP_RAW: u16 = 254;

#[derive(Debug)]
struct SimState {
    raw_position: u16,
    raw_speed: i16,
}

impl SimState {
    fn payload(&self) -> Vec<u8> {
        let p = self.raw_position.to_le_bytes();
        let s = self.raw_speed.to_le_bytes();
        vec![p[0], p[1], s[0], s[1]]
    }
}

/// Simulated desk: commands adjust an internal position and queue position
/// notifications; a background notifier re-announces the current position the
/// way real desk firmware does while its panel is awake.
pub struct SimulatedDesk;

impl SimulatedDesk {
    /// Build a connected source/sink pair starting at `start_raw` (tenths of
    /// a millimeter above the desk's lowest height).
    pub fn new(start_raw: u16) -> (SimulatedPositionSource, SimulatedMoveSink) {
        let state = Arc::new(Mutex::new(SimState {
            raw_position: start_raw,
            raw_speed: 0,
        }));
        let (tx, rx) = xch::unbounded();

        // Interval notifier. Real desk firmware notifies on change, so the
        // notifier stays silent while the actuator is at rest; it exits when
        // the source half is dropped.
        let notifier_state = state.clone();
        let notifier_tx = tx.clone();
        std::thread::spawn(move || {
            loop {
                std::thread::sleep(SIM_NOTIFY_INTERVAL);
                let payload = {
                    let Ok(mut s) = notifier_state.lock() else {
                        break;
                    };
                    if s.raw_speed > 0 {
                        s.raw_position = s.raw_position.saturating_add(SIM_DRIFT_RAW);
                    } else if s.raw_speed < 0 {
                        s.raw_position = s.raw_position.saturating_sub(SIM_DRIFT_RAW);
                    } else {
                        continue;
                    }
                    s.payload()
                };
                if notifier_tx.send(payload).is_err() {
                    break;
                }
            }
        });

        (
            SimulatedPositionSource { rx },
            SimulatedMoveSink { state, tx },
        )
    }
}

pub struct SimulatedPositionSource {
    rx: xch::Receiver<Vec<u8>>,
}

impl PositionSource for SimulatedPositionSource {
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error + Send + Sync>> {
        match self.rx.recv_timeout(timeout) {
            Ok(payload) => Ok(Some(payload)),
            Err(xch::RecvTimeoutError::Timeout) => Err(Box::new(LinkError::Timeout)),
            Err(xch::RecvTimeoutError::Disconnected) => Ok(None),
        }
    }
}

pub struct SimulatedMoveSink {
    state: Arc<Mutex<SimState>>,
    tx: xch::Sender<Vec<u8>>,
}

impl MoveSink for SimulatedMoveSink {
    fn write(&mut self, frame: [u8; 2]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| LinkError::Ble("simulated desk state poisoned".into()))?;
        match frame {
            [0x47, 0x00] => {
                state.raw_position = state.raw_position.saturating_add(SIM_STEP_RAW);
                state.raw_speed = SIM_SPEED;
            }
            [0x46, 0x00] => {
                state.raw_position = state.raw_position.saturating_sub(SIM_STEP_RAW);
                state.raw_speed = -SIM_SPEED;
            }
            [0xFF, 0x00] => {
                state.raw_speed = 0;
            }
            other => {
                return Err(Box::new(LinkError::Ble(format!(
                    "unknown command frame {other:02X?}"
                ))));
            }
        }
        tracing::debug!(frame = ?frame, raw_position = state.raw_position, "simulated desk command");
        // The source half may be gone; the desk still accepts commands.
        let _ = self.tx.send(state.payload());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_match_the_documented_gatt_surface() {
        assert_eq!(
            POSITION_SERVICE_UUID.to_string(),
            "99fa0020-338a-1024-8a49-009c0215f78a"
        );
        assert_eq!(
            POSITION_CHARACTERISTIC_UUID.to_string(),
            "99fa0021-338a-1024-8a49-009c0215f78a"
        );
        assert_eq!(
            MOVE_SERVICE_UUID.to_string(),
            "99fa0001-338a-1024-8a49-009c0215f78a"
        );
        assert_eq!(
            MOVE_CHARACTERISTIC_UUID.to_string(),
            "99fa0002-338a-1024-8a49-009c0215f78a"
        );
    }
}
