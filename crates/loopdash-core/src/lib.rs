// loopdash-core: Reactive swap cache between loopdash-api and the dashboard.

pub mod alert;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use alert::{Alert, AlertSink, AlertStore};
pub use client::SwapClient;
pub use config::{DEFAULT_POLL_INTERVAL, StoreConfig};
pub use error::CoreError;
pub use store::{PollingState, SwapStore};
pub use stream::{SwapStream, SwapWatchStream};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    FailureReason, RECENT_SWAP_WINDOW, SwapEntity, SwapRecord, SwapState, SwapType, UNKNOWN_LABEL,
    failure_label, is_pending_state, state_label, type_name,
};
