// ── Store configuration ──
//
// Tuning for the swap store. Built by `loopdash-config` (or by hand) and
// passed in; core never reads config files.

use std::time::Duration;

use crate::model::RECENT_SWAP_WINDOW;

/// Interval between polls while swaps are in flight.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Period of the refresh timer that runs while any swap is pending.
    pub poll_interval: Duration,
    /// How long a finished swap stays in `processing_swaps`.
    pub recent_window: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            recent_window: RECENT_SWAP_WINDOW,
        }
    }
}
