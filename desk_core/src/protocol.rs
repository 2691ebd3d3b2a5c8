//! Wire protocol for Linak-style desk controllers.
//!
//! The position characteristic notifies 4-byte payloads: little-endian `u16`
//! position offset (tenths of a millimeter above the lowest physical height)
//! followed by little-endian `i16` speed (sign is direction, zero is
//! stopped). The move characteristic accepts fixed 2-byte command frames.
//!
//! ## Fixed-Point Arithmetic
//!
//! The control loop operates in integer tenths of a millimeter (`i32`) for
//! deterministic comparisons; floating point appears only at the API boundary
//! via [`Height`].

use std::fmt;

use crate::error::DeskError;

/// Lowest physical height of the desk surface. Raw positions are offsets
/// above this.
pub const MIN_PHYSICAL_HEIGHT_CM: f64 = 61.5;

/// The same constant in the control loop's integer unit (0.1 mm).
pub const MIN_PHYSICAL_HEIGHT_TMM: i32 = 6150;

pub const CENTIMETERS_PER_INCH: f64 = 2.54;

/// One decoded observation from the position characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeskPosition {
    /// Offset above the lowest physical height, in tenths of a millimeter.
    pub raw_position: u16,
    /// Signed speed in a device-specific unit; zero means stopped.
    pub raw_speed: i16,
}

impl DeskPosition {
    pub fn new(raw_position: u16, raw_speed: i16) -> Self {
        Self {
            raw_position,
            raw_speed,
        }
    }

    /// Decode a position notification payload.
    ///
    /// Payloads shorter than 4 bytes are rejected; extra trailing bytes are
    /// ignored (some firmware revisions pad the notification).
    pub fn decode(data: &[u8]) -> Result<Self, DeskError> {
        if data.len() < 4 {
            return Err(DeskError::Decode(data.len()));
        }
        Ok(Self {
            raw_position: u16::from_le_bytes([data[0], data[1]]),
            raw_speed: i16::from_le_bytes([data[2], data[3]]),
        })
    }

    /// Encode back into the notification wire layout. The device side of the
    /// codec; used by simulators and test fixtures.
    pub fn to_payload(self) -> [u8; 4] {
        let p = self.raw_position.to_le_bytes();
        let s = self.raw_speed.to_le_bytes();
        [p[0], p[1], s[0], s[1]]
    }

    /// Absolute height in tenths of a millimeter.
    pub fn height_tmm(&self) -> i32 {
        MIN_PHYSICAL_HEIGHT_TMM + i32::from(self.raw_position)
    }

    pub fn height(&self) -> Height {
        Height::from_tmm(self.height_tmm())
    }

    pub fn is_stopped(&self) -> bool {
        self.raw_speed == 0
    }
}

/// Move command frames, written to the move characteristic verbatim.
///
/// Hex on the wire: up = `4700`, down = `4600`, stop = `FF00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCommand {
    Up,
    Down,
    Stop,
}

impl MoveCommand {
    pub fn frame(self) -> [u8; 2] {
        match self {
            Self::Up => [0x47, 0x00],
            Self::Down => [0x46, 0x00],
            Self::Stop => [0xFF, 0x00],
        }
    }
}

/// A desk height, canonically in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Height(f64);

impl Height {
    pub fn from_cm(cm: f64) -> Self {
        Self(cm)
    }

    pub fn from_inches(inches: f64) -> Self {
        Self(inches * CENTIMETERS_PER_INCH)
    }

    pub fn from_tmm(tmm: i32) -> Self {
        Self(f64::from(tmm) / 100.0)
    }

    pub fn as_cm(&self) -> f64 {
        self.0
    }

    pub fn as_inches(&self) -> f64 {
        self.0 / CENTIMETERS_PER_INCH
    }

    /// Quantize to the control loop's integer unit, rounding to nearest.
    pub fn as_tmm(&self) -> i32 {
        (self.0 * 100.0).round() as i32
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} cm", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_position_and_speed() {
        // 1778 = 0x06F2, 100 = 0x0064
        let pos = DeskPosition::decode(&[0xF2, 0x06, 0x64, 0x00]).unwrap();
        assert_eq!(pos.raw_position, 1778);
        assert_eq!(pos.raw_speed, 100);
    }

    #[test]
    fn decodes_negative_speed() {
        let pos = DeskPosition::decode(&[0x00, 0x00, 0x9C, 0xFF]).unwrap();
        assert_eq!(pos.raw_speed, -100);
    }

    #[test]
    fn rejects_short_payloads() {
        for len in 0..4 {
            let data = vec![0u8; len];
            match DeskPosition::decode(&data) {
                Err(DeskError::Decode(n)) => assert_eq!(n, len),
                other => panic!("expected Decode error, got {other:?}"),
            }
        }
    }

    #[test]
    fn roundtrips_extremes() {
        for (p, s) in [
            (0u16, 0i16),
            (u16::MAX, i16::MIN),
            (u16::MAX, i16::MAX),
            (1, -1),
        ] {
            let pos = DeskPosition::new(p, s);
            assert_eq!(DeskPosition::decode(&pos.to_payload()).unwrap(), pos);
        }
    }

    #[test]
    fn command_frames_are_bit_exact() {
        assert_eq!(MoveCommand::Up.frame(), [0x47, 0x00]);
        assert_eq!(MoveCommand::Down.frame(), [0x46, 0x00]);
        assert_eq!(MoveCommand::Stop.frame(), [0xFF, 0x00]);
    }

    #[test]
    fn height_adds_minimum_physical_height() {
        let pos = DeskPosition::new(1778, 0);
        let h = pos.height();
        assert!((h.as_cm() - 79.28).abs() < 1e-9);
        assert!((h.as_inches() - 31.212_598_425_196_85).abs() < 1e-9);
    }

    #[test]
    fn height_unit_conversions_agree() {
        let h = Height::from_inches(40.2244);
        assert!((h.as_cm() - 102.169_976).abs() < 1e-6);
        assert_eq!(Height::from_cm(61.5).as_tmm(), MIN_PHYSICAL_HEIGHT_TMM);
    }
}
