//! `From` implementations bridging `desk_config` types to `desk_core` types.
//!
//! These keep the CLI free of field-by-field mapping.

use crate::config::{AutoStandCfg, DoubleTapCfg, MoveCfg, Timeouts};

// ── MoveCfg ──────────────────────────────────────────────────────────────────

impl From<&desk_config::ControlCfg> for MoveCfg {
    fn from(c: &desk_config::ControlCfg) -> Self {
        Self {
            landing_offset_cm: c.landing_offset_cm,
            min_command_interval_ms: c.min_command_interval_ms,
            min_travel_cm: c.min_travel_cm,
        }
    }
}

// ── DoubleTapCfg ─────────────────────────────────────────────────────────────

impl From<&desk_config::DoubleTapCfg> for DoubleTapCfg {
    fn from(c: &desk_config::DoubleTapCfg) -> Self {
        Self {
            enabled: c.enabled,
            window_ms: c.window_ms,
        }
    }
}

// ── AutoStandCfg ─────────────────────────────────────────────────────────────

impl From<&desk_config::AutoStandCfg> for AutoStandCfg {
    fn from(c: &desk_config::AutoStandCfg) -> Self {
        Self {
            enabled: c.enabled,
            stand_minute: c.stand_minute,
            sit_minute: c.sit_minute,
            inactivity_timeout_min: c.inactivity_timeout_min,
        }
    }
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

impl From<&desk_config::Timeouts> for Timeouts {
    fn from(c: &desk_config::Timeouts) -> Self {
        Self {
            telemetry_ms: c.telemetry_ms,
        }
    }
}
