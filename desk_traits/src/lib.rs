pub mod clock;

pub use clock::{Clock, MonotonicClock, WallClock, WallTime};

use std::time::Duration;

/// Source of raw notification payloads from the desk's position characteristic.
///
/// `recv` blocks up to `timeout` for the next payload. `Ok(None)` means the
/// stream has ended (peripheral disconnected or link torn down); an `Err` is a
/// transient link fault the caller may skip over.
pub trait PositionSource {
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: PositionSource + ?Sized> PositionSource for Box<T> {
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).recv(timeout)
    }
}

/// Write-only move characteristic: accepts one 2-byte command frame.
pub trait MoveSink {
    fn write(&mut self, frame: [u8; 2]) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: MoveSink + ?Sized> MoveSink for Box<T> {
    fn write(&mut self, frame: [u8; 2]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write(frame)
    }
}

/// Reports how long the user's input devices (keyboard/pointer) have been idle.
pub trait IdleMonitor {
    fn idle_time(&self) -> Duration;
}
