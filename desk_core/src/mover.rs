//! Closed-loop move control toward a target height.
//!
//! A [`MoveSession`] is the ephemeral state of one `move_to` run: target,
//! direction, last-command bookkeeping, and a cancellation flag. Each
//! telemetry sample drives one [`MoveSession::step`], which either ends the
//! session (arrival, predicted coast past the target, manual interruption)
//! or decides whether to nudge the actuator again.
//!
//! Re-issuing is gated: the observed speed must agree with the intended
//! direction (or be zero), the minimum inter-command interval must have
//! elapsed, and the desk must have traveled the minimum distance since the
//! last issued command. The actuator responds slowly; re-commanding on every
//! notification would flood the link and cause jitter.
//!
//! All heights are integer tenths of a millimeter inside the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use desk_traits::MoveSink;
use desk_traits::clock::Clock;

use crate::config::MoveCfg;
use crate::error::{BuildError, Result};
use crate::hub::Subscription;
use crate::link_error::map_link_error;
use crate::protocol::{DeskPosition, Height, MIN_PHYSICAL_HEIGHT_TMM, MoveCommand};

/// Direction of travel for an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Public status of a move session after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// Not arrived yet; keep feeding samples.
    Moving,
    /// The target equals the starting height; nothing was issued.
    AlreadyAtTarget,
    /// Reached (or about to coast past) the target; Stop has been issued.
    Arrived,
    /// The desk stopped on its own before the target. Treated as a user
    /// override: one Stop issued, session over, not an error.
    Interrupted,
    /// A newer session took write authority; this one issues nothing further.
    Superseded,
    /// Telemetry ended (disconnect) mid-session; abandoned silently.
    Abandoned,
}

impl MoveStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Moving)
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, Copy)]
pub struct MoveOutcome {
    pub status: MoveStatus,
    pub commands_issued: u32,
    pub final_height: Height,
}

pub struct MoveSession<K: MoveSink> {
    sink: Arc<Mutex<K>>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    target_tmm: i32,
    direction: Option<MoveDirection>,
    landing_offset_tmm: i32,
    min_travel_tmm: u32,
    min_interval_ms: u64,
    last_command_at_ms: u64,
    height_at_last_command_tmm: i32,
    last_height_tmm: i32,
    stop_issued: bool,
    finished: Option<MoveStatus>,
    commands_issued: u32,
    cancelled: Arc<AtomicBool>,
}

impl<K: MoveSink> std::fmt::Debug for MoveSession<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoveSession")
            .field("target_tmm", &self.target_tmm)
            .field("direction", &self.direction)
            .field("finished", &self.finished)
            .field("commands_issued", &self.commands_issued)
            .finish_non_exhaustive()
    }
}

impl<K: MoveSink> MoveSession<K> {
    /// Validate the gates and prepare a session toward `target`. The session
    /// issues nothing until [`MoveSession::start`].
    pub fn new(
        sink: Arc<Mutex<K>>,
        cfg: &MoveCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        target: Height,
        cancelled: Arc<AtomicBool>,
    ) -> std::result::Result<Self, BuildError> {
        if cfg.min_command_interval_ms == 0 {
            return Err(BuildError::InvalidConfig(
                "min_command_interval_ms must be > 0",
            ));
        }
        if !(cfg.landing_offset_cm > 0.0) {
            return Err(BuildError::InvalidConfig("landing_offset_cm must be > 0"));
        }
        if !(cfg.min_travel_cm > 0.0) {
            return Err(BuildError::InvalidConfig("min_travel_cm must be > 0"));
        }
        let target_tmm = target.as_tmm();
        let max_tmm = MIN_PHYSICAL_HEIGHT_TMM + i32::from(u16::MAX);
        if !(MIN_PHYSICAL_HEIGHT_TMM..=max_tmm).contains(&target_tmm) {
            return Err(BuildError::InvalidConfig("target height out of range"));
        }
        let epoch = clock.now();
        Ok(Self {
            sink,
            clock,
            epoch,
            target_tmm,
            direction: None,
            landing_offset_tmm: (cfg.landing_offset_cm * 100.0).round() as i32,
            min_travel_tmm: (cfg.min_travel_cm * 100.0).round() as u32,
            min_interval_ms: cfg.min_command_interval_ms,
            last_command_at_ms: 0,
            height_at_last_command_tmm: 0,
            last_height_tmm: 0,
            stop_issued: false,
            finished: None,
            commands_issued: 0,
            cancelled,
        })
    }

    pub fn commands_issued(&self) -> u32 {
        self.commands_issued
    }

    pub fn last_height(&self) -> Height {
        Height::from_tmm(self.last_height_tmm)
    }

    /// Decide the direction from the starting height and issue the first
    /// command. A target equal to the start (after quantization) is an
    /// immediate no-op success: zero commands, terminal.
    pub fn start(&mut self, start: Height) -> Result<MoveStatus> {
        let start_tmm = start.as_tmm();
        self.last_height_tmm = start_tmm;
        self.height_at_last_command_tmm = start_tmm;

        let direction = match self.target_tmm.cmp(&start_tmm) {
            std::cmp::Ordering::Equal => {
                self.finished = Some(MoveStatus::AlreadyAtTarget);
                return Ok(MoveStatus::AlreadyAtTarget);
            }
            std::cmp::Ordering::Greater => MoveDirection::Up,
            std::cmp::Ordering::Less => MoveDirection::Down,
        };
        self.direction = Some(direction);

        tracing::debug!(
            target_cm = f64::from(self.target_tmm) / 100.0,
            start_cm = start.as_cm(),
            ?direction,
            "move session starting"
        );

        let now = self.clock.ms_since(self.epoch);
        if !self.nudge(direction, now, start_tmm)? {
            return Ok(MoveStatus::Superseded);
        }
        Ok(MoveStatus::Moving)
    }

    /// Process one telemetry sample. Once a terminal status was reached the
    /// session is inert and keeps reporting it.
    pub fn step(&mut self, pos: DeskPosition) -> Result<MoveStatus> {
        if let Some(status) = self.finished {
            return Ok(status);
        }
        let Some(direction) = self.direction else {
            return Ok(MoveStatus::Moving);
        };
        if self.cancelled.load(Ordering::SeqCst) {
            return Ok(MoveStatus::Superseded);
        }

        let now = self.clock.ms_since(self.epoch);
        let height = pos.height_tmm();
        self.last_height_tmm = height;

        let passed_target = match direction {
            MoveDirection::Up => height >= self.target_tmm,
            MoveDirection::Down => height <= self.target_tmm,
        };
        // Landing position if we stopped right now, given actuator coast.
        let landing = match direction {
            MoveDirection::Up => height + self.landing_offset_tmm,
            MoveDirection::Down => height - self.landing_offset_tmm,
        };
        let about_to_pass = match direction {
            MoveDirection::Up => landing > self.target_tmm,
            MoveDirection::Down => landing < self.target_tmm,
        };

        let since_last = now.saturating_sub(self.last_command_at_ms);
        let interval_elapsed = since_last > self.min_interval_ms;
        // Zero speed this soon after our own command means the desk stopped
        // on its own (physical switch, obstruction), not because of us.
        let manually_stopped = pos.is_stopped() && !interval_elapsed;

        if passed_target || about_to_pass {
            tracing::debug!(
                height_tmm = height,
                landing_tmm = landing,
                target_tmm = self.target_tmm,
                passed_target,
                "target reached or about to coast past; stopping"
            );
            return self.finish(MoveStatus::Arrived);
        }
        if manually_stopped {
            tracing::debug!(since_last_command_ms = since_last, "manual stop detected");
            return self.finish(MoveStatus::Interrupted);
        }

        let direction_observed = match direction {
            MoveDirection::Up => pos.raw_speed >= 0,
            MoveDirection::Down => pos.raw_speed <= 0,
        };
        let traveled_tmm = height.abs_diff(self.height_at_last_command_tmm);

        if direction_observed && interval_elapsed && traveled_tmm >= self.min_travel_tmm {
            if !self.nudge(direction, now, height)? {
                return Ok(MoveStatus::Superseded);
            }
        } else {
            tracing::trace!(
                direction_observed,
                interval_elapsed,
                traveled_tmm,
                "nudge gated"
            );
        }
        Ok(MoveStatus::Moving)
    }

    /// Drive the session to completion against a telemetry subscription.
    /// Blocks until a terminal status. The loop imposes no session timeout
    /// beyond the gates; with no telemetry at all it only ends via
    /// cancellation or the stream closing.
    pub fn run(mut self, sub: &Subscription, start: Height, poll: Duration) -> Result<MoveOutcome> {
        let status = self.start(start)?;
        if status.is_terminal() {
            return Ok(self.outcome(status));
        }
        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                return Ok(self.outcome(MoveStatus::Superseded));
            }
            match sub.recv_timeout(poll) {
                Ok(pos) => {
                    let status = self.step(pos)?;
                    if status.is_terminal() {
                        return Ok(self.outcome(status));
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!("telemetry ended mid-move; abandoning session");
                    return Ok(self.outcome(MoveStatus::Abandoned));
                }
            }
        }
    }

    fn outcome(&self, status: MoveStatus) -> MoveOutcome {
        MoveOutcome {
            status,
            commands_issued: self.commands_issued,
            final_height: self.last_height(),
        }
    }

    /// Issue a directional command and refresh the gate bookkeeping.
    /// Returns false when the session was superseded before the write.
    fn nudge(&mut self, direction: MoveDirection, now_ms: u64, height_tmm: i32) -> Result<bool> {
        let cmd = match direction {
            MoveDirection::Up => MoveCommand::Up,
            MoveDirection::Down => MoveCommand::Down,
        };
        if !self.write(cmd)? {
            return Ok(false);
        }
        self.last_command_at_ms = now_ms;
        self.height_at_last_command_tmm = height_tmm;
        Ok(true)
    }

    /// Issue exactly one Stop, then latch the terminal status.
    fn finish(&mut self, status: MoveStatus) -> Result<MoveStatus> {
        if !self.stop_issued {
            if !self.write(MoveCommand::Stop)? {
                return Ok(MoveStatus::Superseded);
            }
            self.stop_issued = true;
        }
        self.finished = Some(status);
        Ok(status)
    }

    /// The cancellation check and the write share the sink lock, so a
    /// superseded session can never slip a command in after its successor
    /// has started issuing.
    fn write(&mut self, cmd: MoveCommand) -> Result<bool> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| crate::error::DeskError::Link("move sink poisoned".into()))?;
        if self.cancelled.load(Ordering::SeqCst) {
            return Ok(false);
        }
        tracing::debug!(?cmd, "issuing move command");
        sink.write(cmd.frame())
            .map_err(|e| eyre::Report::new(map_link_error(&*e)))?;
        self.commands_issued += 1;
        Ok(true)
    }
}
