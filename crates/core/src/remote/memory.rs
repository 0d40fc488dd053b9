//! # In-Memory Collection
//!
//! HashMap-backed [`RemoteCollection`] for tests and local development.
//! Documents keep insertion order so snapshots are stable, and a feed
//! failure can be injected to exercise the store's fallback path.

use super::{merge_document, ListenerRegistry, RemoteCollection, RemoteEvent, RemoteSubscription};
use crate::error::{SubscriptionError, WriteError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct MemoryCollection {
    collections: Mutex<HashMap<String, Vec<(String, Value)>>>,
    registry: Arc<ListenerRegistry>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            registry: ListenerRegistry::new(),
        }
    }

    /// Current documents of `collection`, in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .ok()
            .and_then(|collections| {
                collections
                    .get(collection)
                    .map(|docs| docs.iter().map(|(_, doc)| doc.clone()).collect())
            })
            .unwrap_or_default()
    }

    /// Push the live feed into a failed state, as a remote outage would.
    pub fn fail(&self, collection: &str, reason: &str) {
        self.registry.emit(
            collection,
            RemoteEvent::Error(SubscriptionError::Interrupted(reason.to_string())),
        );
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteCollection for MemoryCollection {
    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Value,
        merge: bool,
    ) -> Result<(), WriteError> {
        let snapshot = {
            let mut collections = self
                .collections
                .lock()
                .map_err(|e| WriteError::Remote(format!("collection lock poisoned: {e}")))?;
            let docs = collections.entry(collection.to_string()).or_default();
            match docs.iter().position(|(existing_key, _)| existing_key == key) {
                Some(index) if merge => merge_document(&mut docs[index].1, &document),
                Some(index) => docs[index].1 = document,
                None => docs.push((key.to_string(), document)),
            }
            docs.iter().map(|(_, doc)| doc.clone()).collect()
        };
        self.registry.emit(collection, RemoteEvent::Snapshot(snapshot));
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> RemoteSubscription {
        let (subscription, tx) = self.registry.register(collection);
        // A hosted feed delivers the current snapshot on attach.
        let _ = tx.send(RemoteEvent::Snapshot(self.documents(collection)));
        subscription
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribe_delivers_current_snapshot_first() {
        let collection = MemoryCollection::new();
        collection
            .upsert("agents", "a", json!({ "id": "a" }), true)
            .await
            .unwrap();

        let mut feed = collection.subscribe("agents");
        match feed.recv().await {
            Some(RemoteEvent::Snapshot(docs)) => {
                assert_eq!(docs, vec![json!({ "id": "a" })]);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_merge_upsert_preserves_existing_fields() {
        let collection = MemoryCollection::new();
        collection
            .upsert("agents", "x", json!({ "id": "x", "rating": 4.5, "price": "free" }), true)
            .await
            .unwrap();
        collection
            .upsert("agents", "x", json!({ "id": "x", "price": "paid" }), true)
            .await
            .unwrap();

        let docs = collection.documents("agents");
        assert_eq!(docs[0]["rating"], 4.5);
        assert_eq!(docs[0]["price"], "paid");
    }

    #[tokio::test]
    async fn test_replace_upsert_drops_absent_fields() {
        let collection = MemoryCollection::new();
        collection
            .upsert("agents", "x", json!({ "id": "x", "rating": 4.5 }), true)
            .await
            .unwrap();
        collection
            .upsert("agents", "x", json!({ "id": "x" }), false)
            .await
            .unwrap();

        assert_eq!(collection.documents("agents")[0], json!({ "id": "x" }));
    }

    #[tokio::test]
    async fn test_update_keeps_insertion_order() {
        let collection = MemoryCollection::new();
        collection
            .upsert("agents", "first", json!({ "id": "first" }), true)
            .await
            .unwrap();
        collection
            .upsert("agents", "second", json!({ "id": "second" }), true)
            .await
            .unwrap();
        collection
            .upsert("agents", "first", json!({ "id": "first", "touched": true }), true)
            .await
            .unwrap();

        let docs = collection.documents("agents");
        assert_eq!(docs[0]["id"], "first");
        assert_eq!(docs[1]["id"], "second");
    }

    #[tokio::test]
    async fn test_injected_failure_reaches_subscribers() {
        let collection = MemoryCollection::new();
        let mut feed = collection.subscribe("agents");
        // Skip the initial snapshot.
        feed.recv().await;

        collection.fail("agents", "listener revoked");
        match feed.recv().await {
            Some(RemoteEvent::Error(SubscriptionError::Interrupted(reason))) => {
                assert_eq!(reason, "listener revoked");
            }
            other => panic!("expected error event, got {other:?}"),
        }
    }
}
