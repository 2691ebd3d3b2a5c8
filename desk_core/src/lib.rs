#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core desk-control logic (transport-agnostic).
//!
//! This crate drives a Linak-style standing desk over whatever link the
//! `desk_traits` seams provide. All BLE plumbing lives behind
//! `PositionSource` and `MoveSink`.
//!
//! ## Architecture
//!
//! - **Protocol**: position/speed decoding, command frames, height units
//!   (`protocol` module)
//! - **Telemetry**: decode-and-fan-out pump over the notification stream
//!   (`hub` module)
//! - **Move control**: rate/distance-gated feedback loop with coast
//!   compensation and manual-stop detection (`mover` module)
//! - **Gestures**: double-tap detection from the speed signal (`double_tap`
//!   module)
//! - **Scheduling**: minute-aligned, activity-gated stand/sit (`autostand`
//!   module)
//! - **Facade**: connection state + orchestration (`remote` module)
//!
//! ## Fixed-Point Arithmetic
//!
//! Control internals operate in tenths of a millimeter (`i32`) for
//! deterministic behavior; `Height` carries canonical centimeters at the API
//! boundary.

pub mod autostand;
pub mod config;
pub mod conversions;
pub mod double_tap;
pub mod error;
pub mod hub;
pub mod link_error;
pub mod mocks;
pub mod mover;
pub mod protocol;
pub mod remote;

pub use autostand::{AutoStand, StandSpan};
pub use config::{AutoStandCfg, DoubleTapCfg, MoveCfg, Timeouts};
pub use double_tap::{DoubleTapDetector, SwitchDirection};
pub use error::{BuildError, DeskError};
pub use hub::TelemetryHub;
pub use mover::{MoveOutcome, MoveSession, MoveStatus};
pub use protocol::{DeskPosition, Height, MoveCommand};
pub use remote::{DeskRemote, DeskState};
