//! Double-tap detection from the position/speed signal alone.
//!
//! A physical double tap of the desk switch produces two short pulses of
//! movement, each braking to a stop, in one direction. Within a bounded
//! sample window that shows up as exactly two zero-speed samples with every
//! moving sample sharing one sign. A single sustained press produces at most
//! one observed stop and never matches.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::RecvTimeoutError;
use desk_traits::clock::Clock;

use crate::config::DoubleTapCfg;
use crate::hub::Subscription;
use crate::protocol::DeskPosition;

/// Direction of the physical switch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchDirection {
    Up,
    Down,
}

/// Evaluate one closed sample window.
///
/// Emits a direction only for exactly two discrete stops with all moving
/// samples of one sign. Covers the non-gestures: steady movement (no stop),
/// a desk that was already landed (one stop), mixed-direction noise, and a
/// window with stops but no movement at all.
pub fn evaluate(window: &[DeskPosition]) -> Option<SwitchDirection> {
    let stops = window.iter().filter(|p| p.is_stopped()).count();
    if stops != 2 {
        return None;
    }
    let mut moves = window.iter().filter(|p| !p.is_stopped()).peekable();
    moves.peek()?;
    if moves.clone().all(|p| p.raw_speed > 0) {
        Some(SwitchDirection::Up)
    } else if moves.all(|p| p.raw_speed < 0) {
        Some(SwitchDirection::Down)
    } else {
        None
    }
}

/// Buffers samples into tumbling windows and evaluates each window as it
/// closes. The window opens at its first sample and closes `window_ms`
/// later; the buffer is discarded after every evaluation.
pub struct DoubleTapDetector {
    window_ms: u64,
    buf: Vec<DeskPosition>,
    window_started_at_ms: Option<u64>,
}

impl DoubleTapDetector {
    pub fn new(cfg: &DoubleTapCfg) -> Self {
        Self {
            window_ms: cfg.window_ms.max(1),
            buf: Vec::new(),
            window_started_at_ms: None,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Feed one sample at `now_ms`. If the current window was already due,
    /// it is evaluated (and its verdict returned) before the sample opens or
    /// joins the next window.
    pub fn offer(&mut self, pos: DeskPosition, now_ms: u64) -> Option<SwitchDirection> {
        let fired = self.close_if_due(now_ms);
        if self.window_started_at_ms.is_none() {
            self.window_started_at_ms = Some(now_ms);
        }
        self.buf.push(pos);
        fired
    }

    /// Timer-driven window close for quiet periods with no new samples.
    pub fn flush(&mut self, now_ms: u64) -> Option<SwitchDirection> {
        self.close_if_due(now_ms)
    }

    /// Milliseconds until the open window is due, if one is open.
    pub fn time_until_close(&self, now_ms: u64) -> Option<u64> {
        let start = self.window_started_at_ms?;
        Some((start + self.window_ms).saturating_sub(now_ms))
    }

    fn close_if_due(&mut self, now_ms: u64) -> Option<SwitchDirection> {
        let start = self.window_started_at_ms?;
        if now_ms.saturating_sub(start) < self.window_ms {
            return None;
        }
        let verdict = evaluate(&self.buf);
        self.buf.clear();
        self.window_started_at_ms = None;
        if let Some(direction) = verdict {
            tracing::debug!(?direction, "double tap detected");
        }
        verdict
    }
}

/// Subscribe-and-emit loop. Windows close on time even when no further
/// samples arrive, via the receive timeout. Exits when the telemetry stream
/// ends or `shutdown` is raised.
pub fn run_detector<F: Fn(SwitchDirection)>(
    sub: &Subscription,
    mut detector: DoubleTapDetector,
    clock: &Arc<dyn Clock + Send + Sync>,
    shutdown: &Arc<AtomicBool>,
    emit: F,
) {
    let epoch = clock.now();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let now = clock.ms_since(epoch);
        let wait = detector
            .time_until_close(now)
            .unwrap_or(detector.window_ms());
        match sub.recv_timeout(std::time::Duration::from_millis(wait.max(1))) {
            Ok(pos) => {
                let now = clock.ms_since(epoch);
                if let Some(direction) = detector.offer(pos, now) {
                    emit(direction);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                let now = clock.ms_since(epoch);
                if let Some(direction) = detector.flush(now) {
                    emit(direction);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
