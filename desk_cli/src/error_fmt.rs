//! Human-readable error descriptions and stable exit codes.

use desk_core::{BuildError, DeskError};

/// Map an eyre::Report to a human-readable explanation with likely causes and
/// fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSource => {
                "What happened: No telemetry source was provided to the desk remote.\nLikely causes: The BLE connection failed before the remote was assembled.\nHow to fix: Check the desk is powered and in range, then retry.".to_string()
            }
            BuildError::MissingSink => {
                "What happened: No command sink was provided to the desk remote.\nLikely causes: The BLE connection failed before the remote was assembled.\nHow to fix: Check the desk is powered and in range, then retry.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DeskError>() {
        return match de {
            DeskError::NotConnected => {
                "What happened: No desk is connected.\nLikely causes: The peripheral disconnected, or telemetry has not arrived yet.\nHow to fix: Reconnect (check power/range) and retry; raise ble.scan_timeout_s if discovery is slow.".to_string()
            }
            DeskError::Timeout => {
                "What happened: A link operation timed out.\nLikely causes: Weak BLE signal or a busy adapter.\nHow to fix: Move closer to the desk or raise the [ble] timeouts in the config.".to_string()
            }
            DeskError::Decode(n) => format!(
                "What happened: The desk sent a malformed position payload ({n} bytes).\nLikely causes: Wrong peripheral or firmware variant.\nHow to fix: Verify the desk model; this controller expects 4-byte position notifications."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {err}"
    )
}

/// Map typed desk errors to stable exit codes; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(de) = err.downcast_ref::<DeskError>() {
        return match de {
            DeskError::NotConnected => 2,
            DeskError::Timeout => 3,
            DeskError::Link(_) => 4,
            _ => 1,
        };
    }
    1
}
