// ── Domain model ──
//
// Raw swap records, their typed code views, and the live entity handle
// the store hands out to consumers.

pub mod entity;
pub mod swap;

pub use entity::{RECENT_SWAP_WINDOW, SwapEntity};
pub(crate) use entity::SwapObserver;
pub use swap::{
    FailureReason, SwapRecord, SwapState, SwapType, UNKNOWN_LABEL, failure_label,
    is_pending_state, state_label, type_name,
};
