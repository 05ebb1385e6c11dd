// ── Core error types ──
//
// Exactly one failure reaches the swap store: a fetch failure carrying a
// human-readable message. Transport-layer detail is flattened into that
// message at the `From<loopdash_api::Error>` boundary.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Listing swaps failed. Displays as the bare message so it can be
    /// surfaced to the user verbatim.
    #[error("{message}")]
    Fetch { message: String },

    #[error("No tokio runtime available to drive swap polling")]
    RuntimeUnavailable,
}

impl CoreError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<loopdash_api::Error> for CoreError {
    fn from(err: loopdash_api::Error) -> Self {
        Self::fetch(err.to_string())
    }
}
