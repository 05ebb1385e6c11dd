// ── Poll timer ──
//
// At most one recurring fetch task per store. The handle is an explicit
// `Option` behind a mutex; start is a no-op when present, stop cancels and
// clears it. Cancelling never aborts a fetch already in flight.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::swap_store::StoreInner;

/// Polling state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingState {
    Idle,
    Active,
}

pub(crate) struct Poller {
    period: Duration,
    runtime: Handle,
    /// Present iff a poll task is running.
    handle: Mutex<Option<CancellationToken>>,
    state: watch::Sender<PollingState>,
}

impl Poller {
    pub(crate) fn new(period: Duration, runtime: Handle) -> Self {
        let (state, _) = watch::channel(PollingState::Idle);
        Self {
            period,
            runtime,
            handle: Mutex::new(None),
            state,
        }
    }

    /// Spawn the task built by `task` unless one is already running.
    /// Returns `true` if a task was started.
    pub(crate) fn start<F, Fut>(&self, task: F) -> bool
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.lock();
        if guard.is_some() {
            return false;
        }
        self.spawn(&mut guard, task);
        true
    }

    /// Cancel the running task, if any. Returns `true` if one was stopped.
    pub(crate) fn stop(&self) -> bool {
        let mut guard = self.lock();
        self.cancel(&mut guard)
    }

    /// Run a task iff `pending()` holds, deciding and acting under one
    /// lock so concurrent callers cannot interleave between the check and
    /// the start or stop. Returns the new state on a transition.
    pub(crate) fn reconcile<P, F, Fut>(&self, pending: P, task: F) -> Option<PollingState>
    where
        P: FnOnce() -> bool,
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.lock();
        match (pending(), guard.is_some()) {
            (true, false) => {
                self.spawn(&mut guard, task);
                Some(PollingState::Active)
            }
            (false, true) => {
                self.cancel(&mut guard);
                Some(PollingState::Idle)
            }
            _ => None,
        }
    }

    fn spawn<F, Fut>(&self, slot: &mut Option<CancellationToken>, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        // Detached: the task ends through its token, never by abort.
        self.runtime.spawn(task(cancel.clone()));
        *slot = Some(cancel);
        self.state.send_replace(PollingState::Active);
    }

    fn cancel(&self, slot: &mut Option<CancellationToken>) -> bool {
        let Some(cancel) = slot.take() else {
            return false;
        };
        cancel.cancel();
        self.state.send_replace(PollingState::Idle);
        true
    }

    pub(crate) fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub(crate) fn period(&self) -> Duration {
        self.period
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<PollingState> {
        self.state.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        let cancel = self
            .handle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
    }
}

/// Recurring fetch loop. Holds only a weak reference so a dropped store
/// ends the loop on the next tick.
pub(crate) async fn poll_task(store: Weak<StoreInner>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(store) = store.upgrade() else { break };
                debug!("swap poll tick");
                store.fetch_swaps().await;
            }
        }
    }
    debug!("swap poll task exited");
}
