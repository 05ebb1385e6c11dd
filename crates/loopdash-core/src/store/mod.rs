// ── Reactive swap store ──
//
// Identity-stable entity storage, fetch/merge, and the poll timer.

mod collection;
mod polling;
mod swap_store;

pub use polling::PollingState;
pub use swap_store::SwapStore;
