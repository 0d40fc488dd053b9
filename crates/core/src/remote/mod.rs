//! # Remote Collection Contract
//!
//! The catalog's persistence collaborator: a key-value document collection
//! with merge-upsert writes and a push-based snapshot feed. The store
//! treats it as an eventually-consistent, push-based data source.
//!
//! Two implementations ship in-repo: [`MemoryCollection`] for tests and
//! local development, and [`SqliteCollection`] persisting through the
//! unified database.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCollection;
pub use sqlite::SqliteCollection;

use crate::error::{SubscriptionError, WriteError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One event on a collection's live feed.
#[derive(Debug, Clone)]
pub enum RemoteEvent {
    /// Full snapshot of the collection, in collection-reported order.
    Snapshot(Vec<Value>),
    /// The feed failed; no further events follow.
    Error(SubscriptionError),
}

/// A key-value document collection with a push-based snapshot feed.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Create or update a document keyed by `key`.
    ///
    /// With `merge`, supplied fields are shallow-merged into any existing
    /// document; without it the document is replaced wholesale. Concurrent
    /// writes to the same key resolve last-writer-wins.
    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Value,
        merge: bool,
    ) -> Result<(), WriteError>;

    /// Open a live feed for `collection`.
    ///
    /// The current snapshot is delivered first, then one snapshot per
    /// change, in emission order. Dropping the returned handle releases
    /// the listener.
    fn subscribe(&self, collection: &str) -> RemoteSubscription;
}

/// Live feed handle; dropping it unregisters the listener.
pub struct RemoteSubscription {
    rx: mpsc::UnboundedReceiver<RemoteEvent>,
    _guard: ListenerGuard,
}

impl RemoteSubscription {
    pub fn new(rx: mpsc::UnboundedReceiver<RemoteEvent>, guard: ListenerGuard) -> Self {
        Self { rx, _guard: guard }
    }

    /// Next event, or `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<RemoteEvent> {
        self.rx.recv().await
    }
}

/// Runs its unregister closure exactly once, when dropped.
pub struct ListenerGuard(Option<Box<dyn FnOnce() + Send>>);

impl ListenerGuard {
    pub fn new(unregister: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(unregister)))
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(unregister) = self.0.take() {
            unregister();
        }
    }
}

struct Listener {
    id: u64,
    collection: String,
    tx: mpsc::UnboundedSender<RemoteEvent>,
}

/// Per-collection listener registry shared by the built-in backends.
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        })
    }

    /// Register a listener; returns the subscription handle plus a sender
    /// for delivering the initial snapshot to this listener only.
    pub fn register(
        self: &Arc<Self>,
        collection: &str,
    ) -> (RemoteSubscription, mpsc::UnboundedSender<RemoteEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(Listener {
                id,
                collection: collection.to_string(),
                tx: tx.clone(),
            });
        }
        let registry = Arc::clone(self);
        let guard = ListenerGuard::new(move || {
            if let Ok(mut listeners) = registry.listeners.lock() {
                listeners.retain(|listener| listener.id != id);
            }
        });
        (RemoteSubscription::new(rx, guard), tx)
    }

    /// Fan an event out to every listener of `collection`.
    pub fn emit(&self, collection: &str, event: RemoteEvent) {
        let Ok(listeners) = self.listeners.lock() else {
            return;
        };
        for listener in listeners.iter().filter(|l| l.collection == collection) {
            // A closed receiver is cleaned up by its guard; ignore here.
            let _ = listener.tx.send(event.clone());
        }
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// Shallow-merge `patch` into `base`: object fields overwrite one level
/// deep; anything else replaces wholesale.
pub(crate) fn merge_document(base: &mut Value, patch: &Value) {
    if let (Value::Object(base_map), Value::Object(patch_map)) = (&mut *base, patch) {
        for (key, value) in patch_map {
            base_map.insert(key.clone(), value.clone());
        }
    } else {
        *base = patch.clone();
    }
}
