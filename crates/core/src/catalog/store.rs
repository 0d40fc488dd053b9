//! # Catalog Store
//!
//! Single, consistent, continuously-updated view of all known catalog
//! entries: the built-in seed list plus the remotely persisted,
//! user-created collection.
//!
//! The store subscribes to the remote collection and recomputes its view
//! on every snapshot (never a stale union of two snapshots). Writes go
//! through to the collection and become visible via the subscription push;
//! there is no optimistic local insert. If the feed fails, the store
//! degrades to the seed-only view and stays usable.

use super::entry::{Agent, AgentPatch};
use crate::error::WriteError;
use crate::remote::{RemoteCollection, RemoteEvent};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Collection the user-created entries live in.
pub const AGENTS_COLLECTION: &str = "agents";

type ChangeHandler = Box<dyn Fn(&[Agent]) + Send + Sync>;

struct StoreState {
    seed: Vec<Agent>,
    view: RwLock<Vec<Agent>>,
    /// True until the first subscription callback, success or error.
    loading: AtomicBool,
    subscribers: Mutex<Vec<(u64, ChangeHandler)>>,
    next_subscriber: AtomicU64,
}

impl StoreState {
    fn apply_snapshot(&self, documents: Vec<Value>) {
        let mut next = self.seed.clone();
        for document in documents {
            match serde_json::from_value::<Agent>(document) {
                Ok(agent) => next.push(agent),
                Err(e) => tracing::warn!("skipping undecodable catalog document: {e}"),
            }
        }
        self.replace_view(next);
    }

    fn apply_failure(&self) {
        self.replace_view(self.seed.clone());
    }

    fn replace_view(&self, next: Vec<Agent>) {
        if let Ok(mut view) = self.view.write() {
            *view = next;
        }
        self.loading.store(false, Ordering::SeqCst);
        self.notify();
    }

    fn notify(&self) {
        let view = match self.view.read() {
            Ok(view) => view.clone(),
            Err(_) => return,
        };
        if let Ok(subscribers) = self.subscribers.lock() {
            for (_, handler) in subscribers.iter() {
                handler(&view);
            }
        }
    }
}

/// Observer registration token; dropping it unregisters the handler.
pub struct StoreSubscription {
    state: Arc<StoreState>,
    id: u64,
}

impl Drop for StoreSubscription {
    fn drop(&mut self) {
        if let Ok(mut subscribers) = self.state.subscribers.lock() {
            subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Reactive view over seed entries plus the remote agents collection.
pub struct CatalogStore {
    remote: Arc<dyn RemoteCollection>,
    state: Arc<StoreState>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl CatalogStore {
    /// Create a store over `remote`, seeded with `seed`. The view starts
    /// as the seed list; call [`initialize`](Self::initialize) to start
    /// the live subscription.
    pub fn new(remote: Arc<dyn RemoteCollection>, seed: Vec<Agent>) -> Self {
        let state = Arc::new(StoreState {
            view: RwLock::new(seed.clone()),
            seed,
            loading: AtomicBool::new(true),
            subscribers: Mutex::new(Vec::new()),
            next_subscriber: AtomicU64::new(0),
        });
        Self {
            remote,
            state,
            listener: Mutex::new(None),
        }
    }

    /// Begin the live subscription against the remote collection.
    ///
    /// A second call replaces the previous listener.
    pub fn initialize(&self) {
        let mut subscription = self.remote.subscribe(AGENTS_COLLECTION);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                match event {
                    RemoteEvent::Snapshot(documents) => state.apply_snapshot(documents),
                    RemoteEvent::Error(error) => {
                        tracing::warn!(
                            "agents subscription failed, falling back to seed catalog: {error}"
                        );
                        state.apply_failure();
                        // The feed is dead after an error event.
                        break;
                    }
                }
            }
        });
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(previous) = listener.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Current merged view: seed entries first, remote entries appended.
    pub fn agents(&self) -> Vec<Agent> {
        self.state
            .view
            .read()
            .map(|view| view.clone())
            .unwrap_or_default()
    }

    /// Look up one entry by key.
    pub fn get(&self, id: &str) -> Option<Agent> {
        self.state
            .view
            .read()
            .ok()
            .and_then(|view| view.iter().find(|agent| agent.id == id).cloned())
    }

    /// True from construction until the first subscription callback,
    /// success or error. Never true again afterwards.
    pub fn is_loading(&self) -> bool {
        self.state.loading.load(Ordering::SeqCst)
    }

    /// Register an observer called after every view change, in delivery
    /// order. Drop the returned token to unregister.
    pub fn subscribe_changes(
        &self,
        handler: impl Fn(&[Agent]) + Send + Sync + 'static,
    ) -> StoreSubscription {
        let id = self.state.next_subscriber.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.state.subscribers.lock() {
            subscribers.push((id, Box::new(handler)));
        }
        StoreSubscription {
            state: Arc::clone(&self.state),
            id,
        }
    }

    /// Persist a new user-created entry.
    ///
    /// Visibility follows from the subscription push; the local view is
    /// not touched here. On failure the error propagates and the view is
    /// left unchanged.
    pub async fn create(&self, agent: &Agent) -> Result<(), WriteError> {
        agent.validate()?;
        if !agent.is_user_created {
            return Err(WriteError::Invalid(
                "uploaded entries must be flagged as user-created".into(),
            ));
        }
        self.ensure_not_seed(&agent.id)?;
        let document = serde_json::to_value(agent)?;
        self.remote
            .upsert(AGENTS_COLLECTION, &agent.id, document, true)
            .await
    }

    /// Merge-upsert a partial update into an existing entry. Fields absent
    /// from the patch are preserved remotely.
    pub async fn update(&self, id: &str, patch: &AgentPatch) -> Result<(), WriteError> {
        patch.validate()?;
        self.ensure_not_seed(id)?;
        let document = serde_json::to_value(patch)?;
        self.remote
            .upsert(AGENTS_COLLECTION, id, document, true)
            .await
    }

    fn ensure_not_seed(&self, id: &str) -> Result<(), WriteError> {
        if self.state.seed.iter().any(|agent| agent.id == id) {
            return Err(WriteError::SeedEntry(id.to_string()));
        }
        Ok(())
    }

    /// Tear down the live subscription. Safe to call more than once.
    pub fn close(&self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for CatalogStore {
    fn drop(&mut self) {
        self.close();
    }
}
