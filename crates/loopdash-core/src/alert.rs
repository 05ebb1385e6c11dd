// ── User-visible alerts ──
//
// The store reports fetch failures through `AlertSink` and never looks at
// the result. `AlertStore` is the in-memory sink the dashboard renders
// from: insertion-ordered, keyed by a monotonically increasing id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::debug;

/// Fire-and-forget destination for error messages.
pub trait AlertSink: Send + Sync {
    fn report_error(&self, message: &str);
}

/// A single error shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: u64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory alert list.
pub struct AlertStore {
    next_id: AtomicU64,
    alerts: Mutex<IndexMap<u64, Alert>>,
    /// Number of live alerts, for consumers that wait on changes.
    count: watch::Sender<usize>,
}

impl AlertStore {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            next_id: AtomicU64::new(1),
            alerts: Mutex::new(IndexMap::new()),
            count,
        }
    }

    /// Record an alert and return its id.
    pub fn add(&self, message: impl Into<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let alert = Alert {
            id,
            message: message.into(),
            created_at: Utc::now(),
        };
        debug!(alert_id = id, message = %alert.message, "alert added");

        let mut alerts = self.lock();
        alerts.insert(id, alert);
        self.count.send_replace(alerts.len());
        id
    }

    /// Alerts in the order they were raised.
    pub fn alerts(&self) -> Vec<Alert> {
        self.lock().values().cloned().collect()
    }

    pub fn get(&self, id: u64) -> Option<Alert> {
        self.lock().get(&id).cloned()
    }

    /// Dismiss one alert. Returns `false` if it was already gone.
    pub fn clear_alert(&self, id: u64) -> bool {
        let mut alerts = self.lock();
        let removed = alerts.shift_remove(&id).is_some();
        if removed {
            self.count.send_replace(alerts.len());
        }
        removed
    }

    pub fn clear_all(&self) {
        let mut alerts = self.lock();
        alerts.clear();
        self.count.send_replace(0);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Watch the number of live alerts.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<u64, Alert>> {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for AlertStore {
    fn report_error(&self, message: &str) {
        self.add(message);
    }
}
