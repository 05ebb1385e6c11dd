#![allow(clippy::unwrap_used)]
// Integration tests for `SwapStore` against a scripted in-memory client.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use pretty_assertions::assert_eq;

use loopdash_core::{
    AlertStore, CoreError, DEFAULT_POLL_INTERVAL, PollingState, StoreConfig, SwapClient,
    SwapEntity, SwapRecord, SwapState, SwapStore, SwapType, UNKNOWN_LABEL,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Replays queued responses in order, then repeats the last one forever.
struct FakeClient {
    responses: Mutex<VecDeque<Result<Vec<SwapRecord>, String>>>,
    calls: AtomicUsize,
}

impl FakeClient {
    fn new(responses: Vec<Result<Vec<SwapRecord>, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn returning(records: Vec<SwapRecord>) -> Arc<Self> {
        Self::new(vec![Ok(records)])
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SwapClient for FakeClient {
    fn list_swaps(&self) -> BoxFuture<'_, Result<Vec<SwapRecord>, CoreError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.responses.lock().unwrap();
        let next = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap_or_else(|| Ok(Vec::new()))
        };
        Box::pin(async move { next.map_err(CoreError::fetch) })
    }
}

fn swap(id: &str, state: SwapState, swap_type: SwapType, updated: i64) -> SwapRecord {
    SwapRecord {
        id: id.into(),
        amount: 250_000,
        state: state.code(),
        swap_type: swap_type.code(),
        initiation_time: updated - 1_000,
        last_update_time: updated,
        htlc_address: format!("bc1q{id}"),
        ..SwapRecord::default()
    }
}

/// Seven finished swaps of mixed types and outcomes.
fn finished_swaps() -> Vec<SwapRecord> {
    let mut failed = swap("swap-5", SwapState::Failed, SwapType::LoopIn, 5_000);
    failed.failure_reason = 2;
    vec![
        swap("swap-1", SwapState::Success, SwapType::LoopOut, 1_000),
        swap("swap-2", SwapState::Success, SwapType::LoopIn, 2_000),
        swap("swap-3", SwapState::InvoiceSettled, SwapType::LoopIn, 3_000),
        swap("swap-4", SwapState::Success, SwapType::LoopOut, 4_000),
        failed,
        swap("swap-6", SwapState::Failed, SwapType::LoopOut, 6_000),
        swap("swap-7", SwapState::Success, SwapType::LoopOut, 7_000),
    ]
}

fn new_store(client: Arc<FakeClient>) -> (SwapStore, Arc<AlertStore>) {
    let alerts = Arc::new(AlertStore::new());
    let store = SwapStore::new(client, alerts.clone(), StoreConfig::default()).unwrap();
    (store, alerts)
}

// ── Fetch ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_populates_cache() {
    let client = FakeClient::returning(finished_swaps());
    let (store, alerts) = new_store(client.clone());
    assert!(store.is_empty());

    store.fetch_swaps().await;

    assert_eq!(store.len(), 7);
    assert_eq!(store.swaps().len(), 7);
    assert_eq!(store.sorted_swaps().len(), 7);
    assert!(store.pending_swaps().is_empty());
    assert!(alerts.is_empty());
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_sorted_swaps_newest_first() {
    let (store, _) = new_store(FakeClient::returning(finished_swaps()));
    store.fetch_swaps().await;

    let ids: Vec<String> = store
        .sorted_swaps()
        .iter()
        .map(|s| s.id().to_owned())
        .collect();
    assert_eq!(
        ids,
        vec![
            "swap-7", "swap-6", "swap-5", "swap-4", "swap-3", "swap-2", "swap-1"
        ]
    );
}

#[tokio::test]
async fn test_refetch_keeps_entity_identity() {
    let (store, _) = new_store(FakeClient::returning(finished_swaps()));
    store.fetch_swaps().await;
    let before = store.swap("swap-3").unwrap();

    store.fetch_swaps().await;
    let after = store.swap("swap-3").unwrap();

    assert_eq!(store.len(), 7);
    assert!(SwapEntity::ptr_eq(&before, &after));
}

#[tokio::test]
async fn test_refetch_updates_in_place() {
    let (store, _) = new_store(FakeClient::returning(finished_swaps()));
    store.fetch_swaps().await;

    let held = store.swap("swap-1").unwrap();
    held.set_amount(123);
    assert_eq!(store.swap("swap-1").unwrap().amount(), 123);

    store.fetch_swaps().await;
    assert_eq!(held.amount(), 250_000);
}

#[tokio::test]
async fn test_fetch_merges_new_and_updated_records() {
    let mut second = finished_swaps();
    second[0].label = "relabelled".into();
    second.push(swap("swap-8", SwapState::Success, SwapType::LoopIn, 8_000));
    let client = FakeClient::new(vec![Ok(finished_swaps()), Ok(second)]);
    let (store, _) = new_store(client);

    store.fetch_swaps().await;
    let held = store.swap("swap-1").unwrap();
    store.fetch_swaps().await;

    assert_eq!(store.len(), 8);
    assert_eq!(held.label(), "relabelled");
    assert_eq!(store.sorted_swaps()[0].id(), "swap-8");
}

#[tokio::test]
async fn test_fetch_never_prunes() {
    let client = FakeClient::new(vec![Ok(finished_swaps()), Ok(Vec::new())]);
    let (store, _) = new_store(client);

    store.fetch_swaps().await;
    store.fetch_swaps().await;

    assert_eq!(store.len(), 7);
}

#[tokio::test]
async fn test_fetch_error_reports_one_alert() {
    let client = FakeClient::new(vec![Ok(finished_swaps()), Err("test-err".into())]);
    let (store, alerts) = new_store(client);
    store.fetch_swaps().await;
    let last_fetch = store.last_fetch();

    store.fetch_swaps().await;

    assert_eq!(store.len(), 7);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts.alerts()[0].message, "test-err");
    assert_eq!(store.last_fetch(), last_fetch);
    assert!(!store.is_polling());
}

// ── Labels ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_entity_labels() {
    let (store, _) = new_store(FakeClient::returning(finished_swaps()));
    store.fetch_swaps().await;

    let swap = store.swap("swap-5").unwrap();
    assert_eq!(swap.state_label(), "Failed");
    assert_eq!(swap.type_name(), "Loop In");
    assert_eq!(swap.failure_label(), "Timeout");
    assert!(swap.is_failed());

    swap.set_state(-1);
    assert_eq!(swap.state_label(), UNKNOWN_LABEL);
    swap.set_type(-1);
    assert_eq!(swap.type_name(), UNKNOWN_LABEL);
    // Unknown state is terminal.
    assert!(!store.is_polling());
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_polling_follows_pending_mutations() {
    let (store, _) = new_store(FakeClient::returning(finished_swaps()));
    store.fetch_swaps().await;
    assert_eq!(store.polling_interval(), None);

    let swap = store.swap("swap-2").unwrap();
    swap.set_state(SwapState::Initiated.code());
    assert_eq!(store.polling_interval(), Some(DEFAULT_POLL_INTERVAL));
    assert_eq!(store.pending_swaps().len(), 1);

    swap.set_state(SwapState::Success.code());
    assert_eq!(store.polling_interval(), None);
    assert!(store.pending_swaps().is_empty());
}

#[tokio::test]
async fn test_fetch_with_pending_swap_starts_polling() {
    let mut records = finished_swaps();
    records.push(swap("live", SwapState::HtlcPublished, SwapType::LoopOut, 9_000));
    let (store, _) = new_store(FakeClient::returning(records));
    let state = store.polling_state();

    store.fetch_swaps().await;

    assert!(store.is_polling());
    assert_eq!(*state.borrow(), PollingState::Active);
    store.stop_polling();
    assert_eq!(*state.borrow(), PollingState::Idle);
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let (store, _) = new_store(FakeClient::returning(Vec::new()));

    store.stop_polling();
    assert!(!store.is_polling());

    store.start_polling();
    store.start_polling();
    assert_eq!(store.polling_interval(), Some(DEFAULT_POLL_INTERVAL));

    store.stop_polling();
    store.stop_polling();
    assert_eq!(store.polling_interval(), None);
}

#[tokio::test(start_paused = true)]
async fn test_poll_tick_refetches_until_settled() {
    let pending = vec![swap("live", SwapState::Initiated, SwapType::LoopOut, 1_000)];
    let settled = vec![swap("live", SwapState::Success, SwapType::LoopOut, 2_000)];
    let client = FakeClient::new(vec![Ok(pending.clone()), Ok(pending), Ok(settled)]);
    let (store, _) = new_store(client.clone());

    store.fetch_swaps().await;
    assert!(store.is_polling());
    assert_eq!(client.calls(), 1);

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(client.calls(), 2);
    assert!(store.is_polling());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(client.calls(), 3);
    assert!(!store.is_polling());
    assert_eq!(store.swap("live").unwrap().state_label(), "Success");

    // Timer is gone: no further fetches.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(client.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_store_stops_polling() {
    let pending = vec![swap("live", SwapState::Initiated, SwapType::LoopIn, 1_000)];
    let client = FakeClient::returning(pending);
    let (store, _) = new_store(client.clone());

    store.fetch_swaps().await;
    assert!(store.is_polling());
    drop(store);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(client.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_tick_keeps_polling_until_recovery() {
    let pending = vec![swap("live", SwapState::HtlcPublished, SwapType::LoopIn, 1_000)];
    let settled = vec![swap("live", SwapState::Success, SwapType::LoopIn, 2_000)];
    let client = FakeClient::new(vec![Ok(pending), Err("boom".into()), Ok(settled)]);
    let (store, alerts) = new_store(client.clone());

    store.fetch_swaps().await;
    assert!(store.is_polling());

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(client.calls(), 2);
    assert!(store.is_polling());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts.alerts()[0].message, "boom");
    assert_eq!(store.pending_swaps().len(), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(client.calls(), 3);
    assert!(!store.is_polling());
    assert_eq!(alerts.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_mutations_keep_polling_in_step() {
    let client = FakeClient::returning(vec![
        swap("a", SwapState::Initiated, SwapType::LoopOut, 2_000),
        swap("b", SwapState::Success, SwapType::LoopOut, 1_000),
    ]);
    // Long period so no poll tick rewrites states mid-test.
    let config = StoreConfig {
        poll_interval: Duration::from_secs(3_600),
        ..StoreConfig::default()
    };
    let store = SwapStore::new(client, Arc::new(AlertStore::new()), config).unwrap();
    store.fetch_swaps().await;
    let a = store.swap("a").unwrap();
    let b = store.swap("b").unwrap();

    for _ in 0..500 {
        let barrier = std::sync::Barrier::new(2);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                a.set_state(SwapState::Success.code());
            });
            scope.spawn(|| {
                barrier.wait();
                b.set_state(SwapState::Initiated.code());
            });
        });
        assert!(store.is_polling(), "pending swap without a poll timer");

        std::thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                a.set_state(SwapState::Initiated.code());
            });
            scope.spawn(|| {
                barrier.wait();
                b.set_state(SwapState::Success.code());
            });
        });
        assert!(store.is_polling(), "pending swap without a poll timer");
    }

    a.set_state(SwapState::Success.code());
    assert!(!store.is_polling());
}

// ── Subscriptions ───────────────────────────────────────────────────

#[tokio::test]
async fn test_subscribers_see_fetch_and_mutation() {
    let (store, _) = new_store(FakeClient::returning(finished_swaps()));
    let mut sub = store.subscribe();
    assert!(sub.current().is_empty());

    store.fetch_swaps().await;
    let snap = sub.changed().await.unwrap();
    assert_eq!(snap.len(), 7);

    let version = store.version();
    store.swap("swap-4").unwrap().set_amount(1);
    let snap = sub.changed().await.unwrap();
    assert_eq!(snap.len(), 7);
    assert!(store.version() > version);
    assert!(snap.iter().any(|s| s.id() == "swap-4" && s.amount() == 1));
}

#[tokio::test]
async fn test_subscribers_see_polling_transitions() {
    let (store, _) = new_store(FakeClient::returning(finished_swaps()));
    store.fetch_swaps().await;
    let mut sub = store.subscribe();
    assert_eq!(sub.polling_state(), PollingState::Idle);

    store.swap("swap-1").unwrap().set_state(SwapState::Initiated.code());
    assert_eq!(sub.polling_changed().await, Some(PollingState::Active));

    sub.changed().await.unwrap();
    let pending: Vec<String> = sub.pending().iter().map(|s| s.id().to_owned()).collect();
    assert_eq!(pending, vec!["swap-1"]);
    store.stop_polling();
}
