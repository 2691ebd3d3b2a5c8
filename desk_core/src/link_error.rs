//! Maps `Box<dyn Error>` from trait boundaries to typed `DeskError`.
//!
//! The traits in `desk_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `desk_ble::LinkError` downcasting.

use crate::error::DeskError;

/// Map a trait-boundary error to a typed `DeskError`.
///
/// Attempts to downcast known link error types first, then falls back to
/// string-based heuristics.
pub fn map_link_error(e: &(dyn std::error::Error + 'static)) -> DeskError {
    #[cfg(feature = "link-errors")]
    {
        if let Some(link) = e.downcast_ref::<desk_ble::error::LinkError>() {
            return match link {
                desk_ble::error::LinkError::Timeout => DeskError::Timeout,
                desk_ble::error::LinkError::NotConnected => DeskError::NotConnected,
                other => DeskError::Link(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        DeskError::Timeout
    } else {
        DeskError::Link(s)
    }
}
