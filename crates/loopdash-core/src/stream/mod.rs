// ── Swap subscriptions ──
//
// What a dashboard holds to follow the store: the swap list in display
// order plus the polling state, each backed by a `watch` channel.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::SwapEntity;
use crate::store::PollingState;

/// Live view of a [`SwapStore`](crate::SwapStore).
///
/// The list is the store's sorted order at the last flush. Entries are live
/// handles, so their fields are always current; a new list is published
/// whenever a fetch merges or an entity is mutated.
pub struct SwapStream {
    current: Arc<Vec<SwapEntity>>,
    swaps: watch::Receiver<Arc<Vec<SwapEntity>>>,
    polling: watch::Receiver<PollingState>,
}

impl SwapStream {
    pub(crate) fn new(
        swaps: watch::Receiver<Arc<Vec<SwapEntity>>>,
        polling: watch::Receiver<PollingState>,
    ) -> Self {
        let current = swaps.borrow().clone();
        Self {
            current,
            swaps,
            polling,
        }
    }

    /// Swaps as of creation or the last `changed()`, newest first.
    pub fn current(&self) -> &Arc<Vec<SwapEntity>> {
        &self.current
    }

    /// The most recently published list, without waiting.
    pub fn latest(&self) -> Arc<Vec<SwapEntity>> {
        self.swaps.borrow().clone()
    }

    /// In-flight swaps from [`current`](Self::current).
    pub fn pending(&self) -> Vec<SwapEntity> {
        self.current
            .iter()
            .filter(|s| s.is_pending())
            .cloned()
            .collect()
    }

    pub fn polling_state(&self) -> PollingState {
        *self.polling.borrow()
    }

    /// Wait for the next published list. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Arc<Vec<SwapEntity>>> {
        self.swaps.changed().await.ok()?;
        let snap = self.swaps.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Wait for the poll timer to start or stop. `None` once the store is gone.
    pub async fn polling_changed(&mut self) -> Option<PollingState> {
        self.polling.changed().await.ok()?;
        Some(*self.polling.borrow_and_update())
    }

    /// Convert into a `Stream` of swap lists for `StreamExt` combinators.
    pub fn into_stream(self) -> SwapWatchStream {
        SwapWatchStream {
            inner: WatchStream::new(self.swaps),
        }
    }
}

/// `Stream` of swap lists; yields the current list first.
pub struct SwapWatchStream {
    inner: WatchStream<Arc<Vec<SwapEntity>>>,
}

impl Stream for SwapWatchStream {
    type Item = Arc<Vec<SwapEntity>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
