// ── Identity-stable swap collection ──
//
// Lock-free concurrent storage of live entity handles with push-based
// change notification via `watch` channels. An id maps to the same handle
// for the lifetime of the collection; merges update that handle in place.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

use crate::model::{SwapEntity, SwapObserver, SwapRecord};

/// Keyed set of swap entities.
///
/// Mutations are silent; callers batch them and call [`flush`](Self::flush)
/// once to rebuild the snapshot and wake subscribers.
pub(crate) struct SwapCollection {
    by_id: DashMap<String, SwapEntity>,

    /// Version counter, bumped on every flush.
    version: watch::Sender<u64>,

    /// Display-ordered snapshot, rebuilt on flush for subscribers.
    snapshot: watch::Sender<Arc<Vec<SwapEntity>>>,
}

impl SwapCollection {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Update the entity for `record.id` in place, or insert a new one
    /// bound to `observer`. Returns `true` if the id was new.
    pub(crate) fn upsert_silent(
        &self,
        record: SwapRecord,
        observer: &Weak<dyn SwapObserver>,
    ) -> bool {
        match self.by_id.entry(record.id.clone()) {
            Entry::Occupied(existing) => {
                existing.get().apply(record);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(SwapEntity::attached(record, Weak::clone(observer)));
                true
            }
        }
    }

    pub(crate) fn get(&self, id: &str) -> Option<SwapEntity> {
        self.by_id.get(id).map(|r| r.value().clone())
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All handles, in no particular order.
    pub(crate) fn values(&self) -> Vec<SwapEntity> {
        self.by_id.iter().map(|r| r.value().clone()).collect()
    }

    /// All handles, most recently updated first. Ties fall back to the
    /// newer initiation time, then to the id.
    pub(crate) fn sorted(&self) -> Vec<SwapEntity> {
        let mut swaps = self.values();
        swaps.sort_by_cached_key(|s| {
            (
                Reverse(s.last_update_time()),
                Reverse(s.initiation_time()),
                s.id().to_owned(),
            )
        });
        swaps
    }

    pub(crate) fn to_map(&self) -> HashMap<String, SwapEntity> {
        self.by_id
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    pub(crate) fn any(&self, pred: impl Fn(&SwapEntity) -> bool) -> bool {
        self.by_id.iter().any(|r| pred(r.value()))
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Arc<Vec<SwapEntity>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<SwapEntity>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Rebuild the snapshot and notify subscribers.
    pub(crate) fn flush(&self) {
        let values = self.sorted();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }
}
