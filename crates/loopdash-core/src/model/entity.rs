// ── Live swap entity ──
//
// A cheaply cloneable handle onto one swap. All clones share the same
// field storage, so a handle taken before a refresh observes the values
// written by that refresh. Fields sit behind `ArcSwap`: reads never block,
// writes replace the whole record atomically.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tracing::warn;

use super::swap::{self, SwapRecord, SwapState};

/// How long a finished swap still counts as recent.
pub const RECENT_SWAP_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Receives a notification after every direct mutation of an entity.
pub(crate) trait SwapObserver: Send + Sync {
    fn swap_changed(&self, id: &str);
}

/// Identity-stable, observable wrapper around one swap.
#[derive(Clone)]
pub struct SwapEntity {
    inner: Arc<EntityInner>,
}

struct EntityInner {
    /// Immutable once created.
    id: String,
    record: ArcSwap<SwapRecord>,
    observer: Option<Weak<dyn SwapObserver>>,
}

impl SwapEntity {
    /// Wrap a raw record in a detached entity (no owning store).
    pub fn new(record: SwapRecord) -> Self {
        Self::build(record, None)
    }

    pub(crate) fn attached(record: SwapRecord, observer: Weak<dyn SwapObserver>) -> Self {
        Self::build(record, Some(observer))
    }

    fn build(record: SwapRecord, observer: Option<Weak<dyn SwapObserver>>) -> Self {
        Self {
            inner: Arc::new(EntityInner {
                id: record.id.clone(),
                record: ArcSwap::from_pointee(record),
                observer,
            }),
        }
    }

    /// `true` when both handles point at the same entity.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Overwrite every mutable field from a newer record with the same id.
    ///
    /// Records for a different id are ignored. Returns whether the record
    /// was applied.
    pub fn update(&self, record: SwapRecord) -> bool {
        let applied = self.apply(record);
        if applied {
            self.notify();
        }
        applied
    }

    /// Apply a record without notifying the owning store.
    ///
    /// Used by bulk merges, which re-evaluate the store once at the end.
    pub(crate) fn apply(&self, record: SwapRecord) -> bool {
        if record.id != self.inner.id {
            warn!(
                swap_id = %self.inner.id,
                record_id = %record.id,
                "ignoring record for a different swap"
            );
            return false;
        }
        self.inner.record.store(Arc::new(record));
        true
    }

    pub fn set_state(&self, state: i32) {
        self.modify(|r| r.state = state);
    }

    pub fn set_amount(&self, amount: i64) {
        self.modify(|r| r.amount = amount);
    }

    pub fn set_type(&self, swap_type: i32) {
        self.modify(|r| r.swap_type = swap_type);
    }

    fn modify(&self, f: impl Fn(&mut SwapRecord)) {
        self.inner.record.rcu(|current| {
            let mut next = SwapRecord::clone(current);
            f(&mut next);
            next
        });
        self.notify();
    }

    fn notify(&self) {
        if let Some(observer) = self.inner.observer.as_ref().and_then(Weak::upgrade) {
            observer.swap_changed(&self.inner.id);
        }
    }

    // ── Fields ───────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Point-in-time copy of every field.
    pub fn record(&self) -> Arc<SwapRecord> {
        self.inner.record.load_full()
    }

    pub fn amount(&self) -> i64 {
        self.inner.record.load().amount
    }

    pub fn state(&self) -> i32 {
        self.inner.record.load().state
    }

    pub fn swap_type(&self) -> i32 {
        self.inner.record.load().swap_type
    }

    pub fn failure_reason(&self) -> i32 {
        self.inner.record.load().failure_reason
    }

    pub fn initiation_time(&self) -> i64 {
        self.inner.record.load().initiation_time
    }

    pub fn last_update_time(&self) -> i64 {
        self.inner.record.load().last_update_time
    }

    pub fn htlc_address(&self) -> String {
        self.inner.record.load().htlc_address.clone()
    }

    pub fn label(&self) -> String {
        self.inner.record.load().label.clone()
    }

    pub fn outgoing_chan_set(&self) -> Vec<u64> {
        self.inner.record.load().outgoing_chan_set.clone()
    }

    // ── Derived ──────────────────────────────────────────────────────

    pub fn state_label(&self) -> &'static str {
        swap::state_label(self.state())
    }

    pub fn type_name(&self) -> &'static str {
        swap::type_name(self.swap_type())
    }

    pub fn failure_label(&self) -> &'static str {
        swap::failure_label(self.failure_reason())
    }

    pub fn is_pending(&self) -> bool {
        swap::is_pending_state(self.state())
    }

    /// State is FAILED. The failure reason alone does not count.
    pub fn is_failed(&self) -> bool {
        SwapState::from_code(self.state()) == Some(SwapState::Failed)
    }

    pub fn created_on(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_nanos(self.initiation_time())
    }

    pub fn updated_on(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_nanos(self.last_update_time())
    }

    /// Updated within [`RECENT_SWAP_WINDOW`] of `now`.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        self.updated_within(now, RECENT_SWAP_WINDOW)
    }

    pub fn updated_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let Ok(window) = chrono::Duration::from_std(window) else {
            return true;
        };
        now.signed_duration_since(self.updated_on()) <= window
    }

    /// Short form of the id for tables: `abcdef...uvwxyz`.
    pub fn id_ellipsed(&self) -> String {
        let id = self.id();
        let chars: Vec<char> = id.chars().collect();
        if chars.len() <= 12 {
            return id.to_owned();
        }
        let head: String = chars.iter().take(6).collect();
        let tail: String = chars.iter().skip(chars.len() - 6).collect();
        format!("{head}...{tail}")
    }

    /// Server, on-chain, and off-chain costs combined, in satoshis.
    pub fn total_cost(&self) -> i64 {
        let r = self.inner.record.load();
        r.cost_server
            .saturating_add(r.cost_onchain)
            .saturating_add(r.cost_offchain)
    }
}

impl fmt::Debug for SwapEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.inner.record.load();
        f.debug_struct("SwapEntity")
            .field("id", &self.inner.id)
            .field("amount", &record.amount)
            .field("state", &self.state_label())
            .field("type", &self.type_name())
            .finish_non_exhaustive()
    }
}
