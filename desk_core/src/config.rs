//! Runtime configuration types for the desk control core.
//!
//! These are the structs the controllers consume at runtime. They are
//! separate from the TOML-deserialized schema in `desk_config`.

/// Move controller gates and coast compensation.
#[derive(Debug, Clone)]
pub struct MoveCfg {
    /// Expected travel between a stop command and the actuator physically
    /// landing, at full speed. Stopping is pre-empted by this much.
    pub landing_offset_cm: f64,
    /// Minimum time between issued move commands.
    pub min_command_interval_ms: u64,
    /// Minimum travel since the last issued command before nudging again.
    pub min_travel_cm: f64,
}

impl Default for MoveCfg {
    fn default() -> Self {
        Self {
            landing_offset_cm: 0.5,
            min_command_interval_ms: 500,
            min_travel_cm: 0.5,
        }
    }
}

/// Double-tap gesture detection configuration.
#[derive(Debug, Clone)]
pub struct DoubleTapCfg {
    pub enabled: bool,
    /// Width of the tumbling sample window the gesture must fit in.
    pub window_ms: u64,
}

impl Default for DoubleTapCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            window_ms: 1000,
        }
    }
}

/// Automatic stand/sit scheduling. Markers are minutes of the hour.
#[derive(Debug, Clone)]
pub struct AutoStandCfg {
    pub enabled: bool,
    pub stand_minute: u32,
    pub sit_minute: u32,
    /// User counts as present while input idle time is below this.
    pub inactivity_timeout_min: u32,
}

impl Default for AutoStandCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            stand_minute: 55,
            sit_minute: 0,
            inactivity_timeout_min: 5,
        }
    }
}

/// Timeouts and polling cadence.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max wait per telemetry recv before re-checking shutdown/cancel flags.
    pub telemetry_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { telemetry_ms: 250 }
    }
}
