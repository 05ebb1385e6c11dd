// ── Swap store ──
//
// Owns the keyed swap collection, merges fetch results into it, and keeps
// the poll timer running exactly while some swap is pending. The pending
// check runs after every fetch and after every direct entity mutation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use super::collection::SwapCollection;
use super::polling::{Poller, PollingState, poll_task};
use crate::alert::AlertSink;
use crate::client::SwapClient;
use crate::config::StoreConfig;
use crate::error::CoreError;
use crate::model::{SwapEntity, SwapObserver};
use crate::stream::SwapStream;

/// Reactive cache of every swap the daemon has reported.
///
/// Cheaply cloneable via `Arc<StoreInner>`. Dropping the last clone stops
/// the poll timer.
#[derive(Clone)]
pub struct SwapStore {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    config: StoreConfig,
    client: Arc<dyn SwapClient>,
    alerts: Arc<dyn AlertSink>,
    swaps: SwapCollection,
    dismissed: DashSet<String>,
    poller: Poller,
    last_fetch: watch::Sender<Option<DateTime<Utc>>>,
    /// Handed to entities as their observer and to the poll task.
    self_ref: Weak<StoreInner>,
}

impl SwapStore {
    /// Create a store driven by the current tokio runtime.
    ///
    /// Fails with [`CoreError::RuntimeUnavailable`] outside a runtime.
    pub fn new(
        client: Arc<dyn SwapClient>,
        alerts: Arc<dyn AlertSink>,
        config: StoreConfig,
    ) -> Result<Self, CoreError> {
        let runtime = Handle::try_current().map_err(|_| CoreError::RuntimeUnavailable)?;
        Ok(Self::with_runtime(client, alerts, config, runtime))
    }

    /// Create a store whose poll task is spawned onto `runtime`.
    pub fn with_runtime(
        client: Arc<dyn SwapClient>,
        alerts: Arc<dyn AlertSink>,
        config: StoreConfig,
        runtime: Handle,
    ) -> Self {
        let (last_fetch, _) = watch::channel(None);
        let poller = Poller::new(config.poll_interval, runtime);
        let inner = Arc::new_cyclic(|self_ref| StoreInner {
            config,
            client,
            alerts,
            swaps: SwapCollection::new(),
            dismissed: DashSet::new(),
            poller,
            last_fetch,
            self_ref: Weak::clone(self_ref),
        });
        Self { inner }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    // ── Fetch ────────────────────────────────────────────────────────

    /// Fetch every swap and merge it into the cache.
    ///
    /// Never fails: an error is reported to the alert sink and the cache is
    /// left as it was. Either way the polling condition is re-evaluated.
    pub async fn fetch_swaps(&self) {
        self.inner.fetch_swaps().await;
    }

    // ── Read surface ─────────────────────────────────────────────────

    /// Every cached swap, most recently updated first.
    pub fn sorted_swaps(&self) -> Vec<SwapEntity> {
        self.inner.sorted_swaps()
    }

    /// Swaps that are still in flight, in sorted order.
    pub fn pending_swaps(&self) -> Vec<SwapEntity> {
        self.sorted_swaps()
            .into_iter()
            .filter(SwapEntity::is_pending)
            .collect()
    }

    /// The keyed collection, for size and membership checks.
    pub fn swaps(&self) -> HashMap<String, SwapEntity> {
        self.inner.swaps.to_map()
    }

    pub fn swap(&self, id: &str) -> Option<SwapEntity> {
        self.inner.swaps.get(id)
    }

    pub fn len(&self) -> usize {
        self.inner.swaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.swaps.is_empty()
    }

    /// Swaps worth showing in a "processing" panel: pending or updated
    /// within the recent window, minus the ones the user dismissed.
    pub fn processing_swaps(&self, now: DateTime<Utc>) -> Vec<SwapEntity> {
        let window = self.inner.config.recent_window;
        self.sorted_swaps()
            .into_iter()
            .filter(|s| !self.inner.dismissed.contains(s.id()))
            .filter(|s| s.is_pending() || s.updated_within(now, window))
            .collect()
    }

    /// Hide a swap from [`processing_swaps`](Self::processing_swaps).
    pub fn dismiss_swap(&self, id: &str) {
        debug!(swap_id = %id, "dismissing swap");
        self.inner.dismissed.insert(id.to_owned());
        self.inner.swaps.flush();
    }

    /// Swaps grouped by the outgoing channels they were restricted to.
    pub fn swapped_channels(&self) -> BTreeMap<u64, Vec<SwapEntity>> {
        let mut by_channel: BTreeMap<u64, Vec<SwapEntity>> = BTreeMap::new();
        for swap in self.sorted_swaps() {
            for chan_id in swap.outgoing_chan_set() {
                by_channel.entry(chan_id).or_default().push(swap.clone());
            }
        }
        by_channel
    }

    /// Time of the last successful fetch.
    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_fetch.borrow()
    }

    /// Bumped every time the cache or any entity in it changes.
    pub fn version(&self) -> u64 {
        self.inner.swaps.version()
    }

    /// Subscribe to cache changes and polling transitions.
    pub fn subscribe(&self) -> SwapStream {
        SwapStream::new(self.inner.swaps.subscribe(), self.inner.poller.subscribe())
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Start the refresh timer. No-op if it is already running.
    pub fn start_polling(&self) {
        self.inner.start_polling();
    }

    /// Cancel the refresh timer. No-op if it is not running.
    pub fn stop_polling(&self) {
        self.inner.stop_polling();
    }

    /// The timer period while polling, `None` while idle.
    pub fn polling_interval(&self) -> Option<Duration> {
        self.inner
            .poller
            .is_active()
            .then(|| self.inner.poller.period())
    }

    pub fn is_polling(&self) -> bool {
        self.inner.poller.is_active()
    }

    pub fn polling_state(&self) -> watch::Receiver<PollingState> {
        self.inner.poller.subscribe()
    }
}

impl StoreInner {
    pub(crate) async fn fetch_swaps(&self) {
        debug!("fetching swaps");
        match self.client.list_swaps().await {
            Ok(records) => {
                let count = records.len();
                let mut added = 0usize;
                let observer: Weak<dyn SwapObserver> = self.self_ref.clone();
                for record in records {
                    if self.swaps.upsert_silent(record, &observer) {
                        added += 1;
                    }
                }
                self.swaps.flush();
                self.last_fetch.send_replace(Some(Utc::now()));
                debug!(count, added, total = self.swaps.len(), "merged swaps");
            }
            Err(e) => {
                warn!(error = %e, "swap fetch failed");
                self.alerts.report_error(&e.to_string());
            }
        }
        self.evaluate_polling();
    }

    fn sorted_swaps(&self) -> Vec<SwapEntity> {
        self.swaps.sorted()
    }

    /// Idle ↔ Active transition check. The pending scan runs under the
    /// poller's lock, so a concurrent mutation is seen by one of the two
    /// evaluations.
    fn evaluate_polling(&self) {
        let store = self.self_ref.clone();
        let period = self.poller.period();
        let transition = self.poller.reconcile(
            || self.swaps.any(SwapEntity::is_pending),
            move |cancel| poll_task(store, period, cancel),
        );
        match transition {
            Some(PollingState::Active) => info!(interval = ?period, "swap polling started"),
            Some(PollingState::Idle) => info!("swap polling stopped"),
            None => {}
        }
    }

    fn start_polling(&self) {
        let store = self.self_ref.clone();
        let period = self.poller.period();
        if self
            .poller
            .start(move |cancel| poll_task(store, period, cancel))
        {
            info!(interval = ?period, "swap polling started");
        }
    }

    fn stop_polling(&self) {
        if self.poller.stop() {
            info!("swap polling stopped");
        }
    }
}

impl SwapObserver for StoreInner {
    fn swap_changed(&self, id: &str) {
        trace!(swap_id = %id, "swap mutated");
        self.swaps.flush();
        self.evaluate_polling();
    }
}
