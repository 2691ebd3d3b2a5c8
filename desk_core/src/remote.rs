//! Connection state and the remote-control façade over one desk.
//!
//! `DeskRemote` owns the telemetry hub, tracks the connection state, runs the
//! double-tap detector, and orchestrates move sessions. The desk link is the
//! single shared resource: at most one move session holds write authority at
//! a time, enforced by superseding cancellation rather than by locking
//! telemetry reads (reads are always safe).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use desk_traits::clock::Clock;
use desk_traits::{MoveSink, PositionSource};

use crate::config::{DoubleTapCfg, MoveCfg, Timeouts};
use crate::double_tap::{DoubleTapDetector, SwitchDirection, run_detector};
use crate::error::{BuildError, DeskError, Result};
use crate::hub::TelemetryHub;
use crate::link_error::map_link_error;
use crate::mover::{MoveOutcome, MoveSession, MoveStatus};
use crate::protocol::{Height, MoveCommand};

/// Lifecycle of the desk link. The connected variant carries the last-known
/// height, refreshed on every telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DeskState {
    #[default]
    Unknown,
    Connecting,
    Connected {
        last_height: Height,
    },
    Disconnecting,
    Disconnected,
}

impl DeskState {
    pub fn height(&self) -> Option<Height> {
        match self {
            Self::Connected { last_height } => Some(*last_height),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

type HeightCallback = Arc<dyn Fn(Height) + Send + Sync>;
type TapCallback = Arc<dyn Fn(SwitchDirection) + Send + Sync>;
type MoveCallback = Arc<dyn Fn(MoveStatus) + Send + Sync>;

pub struct DeskRemote {
    sink: Arc<Mutex<Box<dyn MoveSink + Send>>>,
    hub: TelemetryHub,
    clock: Arc<dyn Clock + Send + Sync>,
    move_cfg: MoveCfg,
    timeouts: Timeouts,
    state: Arc<Mutex<DeskState>>,
    active_cancel: Mutex<Option<Arc<AtomicBool>>>,
    on_move_complete: Option<MoveCallback>,
    shutdown: Arc<AtomicBool>,
    watcher: Option<JoinHandle<()>>,
    detector: Option<JoinHandle<()>>,
}

impl DeskRemote {
    /// Start building a remote over a connected desk link.
    pub fn builder() -> DeskRemoteBuilder {
        DeskRemoteBuilder::default()
    }

    /// Snapshot of the connection state.
    pub fn state(&self) -> DeskState {
        self.state.lock().map(|s| *s).unwrap_or(DeskState::Unknown)
    }

    /// Last-known height, or `NotConnected` before telemetry has flowed or
    /// after a disconnect.
    pub fn current_height(&self) -> Result<Height> {
        self.state()
            .height()
            .ok_or_else(|| eyre::Report::new(DeskError::NotConnected))
    }

    /// Drive the desk to `target` and block until the session ends.
    ///
    /// Starting a new move cancels any in-flight session before this one
    /// issues its first command; the superseded session reports
    /// `MoveStatus::Superseded` to its own caller.
    pub fn move_to(&self, target: Height) -> Result<MoveOutcome> {
        let start = self.current_height()?;

        let cancel = Arc::new(AtomicBool::new(false));
        self.supersede(Some(cancel.clone()));

        let sub = self.hub.subscribe();
        let session = MoveSession::new(
            self.sink.clone(),
            &self.move_cfg,
            self.clock.clone(),
            target,
            cancel,
        )
        .map_err(eyre::Report::new)?;

        let poll = Duration::from_millis(self.timeouts.telemetry_ms.max(1));
        let outcome = session.run(&sub, start, poll)?;

        tracing::info!(
            status = ?outcome.status,
            commands = outcome.commands_issued,
            final_cm = outcome.final_height.as_cm(),
            "move session finished"
        );
        if let Some(cb) = &self.on_move_complete {
            cb(outcome.status);
        }
        Ok(outcome)
    }

    /// One-shot nudge upward. Cancels any active session first so write
    /// authority stays single-owner.
    pub fn move_up(&self) -> Result<()> {
        self.manual(MoveCommand::Up)
    }

    /// One-shot nudge downward.
    pub fn move_down(&self) -> Result<()> {
        self.manual(MoveCommand::Down)
    }

    /// Stop any movement now.
    pub fn stop_moving(&self) -> Result<()> {
        self.manual(MoveCommand::Stop)
    }

    /// Tear the session down: cancels moves, stops the watcher and detector,
    /// and settles the state at `Disconnected`.
    pub fn disconnect(&mut self) {
        self.set_state(DeskState::Disconnecting);
        self.supersede(None);
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.watcher.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.detector.take() {
            let _ = handle.join();
        }
        self.set_state(DeskState::Disconnected);
    }

    fn manual(&self, cmd: MoveCommand) -> Result<()> {
        if !self.state().is_connected() {
            return Err(eyre::Report::new(DeskError::NotConnected));
        }
        self.supersede(None);
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| DeskError::Link("move sink poisoned".into()))?;
        tracing::debug!(?cmd, "issuing manual command");
        sink.write(cmd.frame())
            .map_err(|e| eyre::Report::new(map_link_error(&*e)))
    }

    /// Cancel the in-flight session, if any, and install `next` as the new
    /// holder of write authority.
    fn supersede(&self, next: Option<Arc<AtomicBool>>) {
        if let Ok(mut slot) = self.active_cancel.lock() {
            let prev = std::mem::replace(&mut *slot, next);
            if let Some(prev) = prev {
                prev.store(true, Ordering::SeqCst);
            }
        }
    }

    fn set_state(&self, state: DeskState) {
        if let Ok(mut s) = self.state.lock() {
            *s = state;
        }
    }
}

impl Drop for DeskRemote {
    fn drop(&mut self) {
        self.supersede(None);
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.watcher.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.detector.take() {
            let _ = handle.join();
        }
    }
}

/// Builder for `DeskRemote`. Source and sink are required; everything else
/// has defaults.
#[derive(Default)]
pub struct DeskRemoteBuilder {
    source: Option<Box<dyn PositionSource + Send>>,
    sink: Option<Box<dyn MoveSink + Send>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    move_cfg: Option<MoveCfg>,
    double_tap_cfg: Option<DoubleTapCfg>,
    timeouts: Option<Timeouts>,
    starting_height: Option<Height>,
    on_height_changed: Option<HeightCallback>,
    on_double_tap: Option<TapCallback>,
    on_move_complete: Option<MoveCallback>,
}

impl DeskRemoteBuilder {
    pub fn with_source(mut self, source: impl PositionSource + Send + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_sink(mut self, sink: impl MoveSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_move_cfg(mut self, cfg: MoveCfg) -> Self {
        self.move_cfg = Some(cfg);
        self
    }

    pub fn with_double_tap_cfg(mut self, cfg: DoubleTapCfg) -> Self {
        self.double_tap_cfg = Some(cfg);
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Height read at connect time; lets `move_to` work before the first
    /// notification arrives.
    pub fn with_starting_height(mut self, height: Height) -> Self {
        self.starting_height = Some(height);
        self
    }

    pub fn on_height_changed(mut self, cb: impl Fn(Height) + Send + Sync + 'static) -> Self {
        self.on_height_changed = Some(Arc::new(cb));
        self
    }

    /// Registering a callback turns the double-tap detector on.
    pub fn on_double_tap(mut self, cb: impl Fn(SwitchDirection) + Send + Sync + 'static) -> Self {
        self.on_double_tap = Some(Arc::new(cb));
        self
    }

    pub fn on_move_complete(mut self, cb: impl Fn(MoveStatus) + Send + Sync + 'static) -> Self {
        self.on_move_complete = Some(Arc::new(cb));
        self
    }

    pub fn build(self) -> Result<DeskRemote> {
        let source = self
            .source
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSource))?;
        let sink = self
            .sink
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSink))?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(desk_traits::MonotonicClock::new()));
        let move_cfg = self.move_cfg.unwrap_or_default();
        let double_tap_cfg = self.double_tap_cfg.unwrap_or_default();
        let timeouts = self.timeouts.unwrap_or_default();

        let poll = Duration::from_millis(timeouts.telemetry_ms.max(1));
        let hub = TelemetryHub::spawn(source, poll);
        let shutdown = Arc::new(AtomicBool::new(false));

        let initial = match self.starting_height {
            Some(h) => DeskState::Connected { last_height: h },
            None => DeskState::Connecting,
        };
        let state = Arc::new(Mutex::new(initial));

        // State tracker: refresh last-known height on every sample, settle at
        // Disconnected when the stream ends.
        let watcher = {
            let sub = hub.subscribe();
            let state = state.clone();
            let shutdown = shutdown.clone();
            let on_height = self.on_height_changed.clone();
            std::thread::spawn(move || {
                loop {
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    match sub.recv_timeout(poll) {
                        Ok(sample) => {
                            let height = sample.height();
                            if let Ok(mut s) = state.lock() {
                                match *s {
                                    DeskState::Disconnecting | DeskState::Disconnected => {}
                                    _ => {
                                        *s = DeskState::Connected {
                                            last_height: height,
                                        }
                                    }
                                }
                            }
                            if let Some(cb) = &on_height {
                                cb(height);
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => {
                            if let Ok(mut s) = state.lock() {
                                *s = DeskState::Disconnected;
                            }
                            break;
                        }
                    }
                }
            })
        };

        let detector = self.on_double_tap.map(|cb| {
            let sub = hub.subscribe();
            let det = DoubleTapDetector::new(&double_tap_cfg);
            let clock = clock.clone();
            let shutdown = shutdown.clone();
            std::thread::spawn(move || {
                run_detector(&sub, det, &clock, &shutdown, |direction| cb(direction));
            })
        });

        Ok(DeskRemote {
            sink: Arc::new(Mutex::new(sink)),
            hub,
            clock,
            move_cfg,
            timeouts,
            state,
            active_cancel: Mutex::new(None),
            on_move_complete: self.on_move_complete,
            shutdown,
            watcher: Some(watcher),
            detector,
        })
    }
}
