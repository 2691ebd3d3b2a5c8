#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Settings schema and validation for the desk controller.
//!
//! `Config` and sub-structs are deserialized from TOML and validated. Every
//! section has defaults matching the stock desk behavior, so an empty file is
//! a valid configuration.

use serde::Deserialize;

/// Stand/sit target heights. Stored in inches regardless of display unit.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DeskCfg {
    pub standing_height_in: f64,
    pub sitting_height_in: f64,
}

impl Default for DeskCfg {
    fn default() -> Self {
        Self {
            standing_height_in: 40.2244,
            sitting_height_in: 25.0,
        }
    }
}

/// Move controller gates and coast compensation.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ControlCfg {
    /// Expected travel between a stop command and the actuator landing.
    pub landing_offset_cm: f64,
    /// Minimum time between issued move commands (ms).
    pub min_command_interval_ms: u64,
    /// Minimum travel since the last issued command before nudging again.
    pub min_travel_cm: f64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            landing_offset_cm: 0.5,
            min_command_interval_ms: 500,
            min_travel_cm: 0.5,
        }
    }
}

/// Double-tap gesture recognition from the physical switch.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DoubleTapCfg {
    pub enabled: bool,
    /// Sample window the gesture must fit in (ms).
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

/// Automatic stand/sit markers, minutes of every hour.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct AutoStandCfg {
    pub enabled: bool,
    pub stand_minute: u32,
    pub sit_minute: u32,
    /// The desk only moves automatically while input idle time is below this.
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

/// BLE discovery and link-level timeouts (caller-specified per operation).
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BleCfg {
    /// Peripheral name substring to match while scanning.
    pub name_pattern: String,
    pub scan_timeout_s: u64,
    pub connect_timeout_s: u64,
    pub write_timeout_s: u64,
    pub read_timeout_s: u64,
}

impl Default for BleCfg {
    fn default() -> Self {
        Self {
            name_pattern: "Desk".to_string(),
            scan_timeout_s: 30,
            connect_timeout_s: 60,
            write_timeout_s: 15,
            read_timeout_s: 15,
        }
    }
}

/// Polling cadence for the telemetry plumbing.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Timeouts {
    pub telemetry_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { telemetry_ms: 250 }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub desk: DeskCfg,
    pub control: ControlCfg,
    pub double_tap: DoubleTapCfg,
    pub autostand: AutoStandCfg,
    pub ble: BleCfg,
    pub timeouts: Timeouts,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.desk.standing_height_in <= self.desk.sitting_height_in {
            eyre::bail!("desk.standing_height_in must be above desk.sitting_height_in");
        }
        if self.desk.sitting_height_in <= 0.0 {
            eyre::bail!("desk.sitting_height_in must be positive");
        }
        if !(self.control.landing_offset_cm > 0.0) {
            eyre::bail!("control.landing_offset_cm must be > 0");
        }
        if self.control.min_command_interval_ms == 0 {
            eyre::bail!("control.min_command_interval_ms must be > 0");
        }
        if !(self.control.min_travel_cm > 0.0) {
            eyre::bail!("control.min_travel_cm must be > 0");
        }
        if self.double_tap.window_ms == 0 {
            eyre::bail!("double_tap.window_ms must be > 0");
        }
        if self.autostand.stand_minute >= 60 {
            eyre::bail!(
                "autostand.stand_minute must be in 0..60, got {}",
                self.autostand.stand_minute
            );
        }
        if self.autostand.sit_minute >= 60 {
            eyre::bail!(
                "autostand.sit_minute must be in 0..60, got {}",
                self.autostand.sit_minute
            );
        }
        if self.timeouts.telemetry_ms == 0 {
            eyre::bail!("timeouts.telemetry_ms must be > 0");
        }
        if self.ble.name_pattern.is_empty() {
            eyre::bail!("ble.name_pattern must not be empty");
        }
        Ok(())
    }
}
