//! # SQLite Collection
//!
//! [`RemoteCollection`] persisted through the unified database. Gives a
//! self-hosted deployment the same push-based contract the hosted document
//! store provides.

use super::{ListenerRegistry, RemoteCollection, RemoteEvent, RemoteSubscription};
use crate::db::AsynaptixDb;
use crate::error::{SubscriptionError, WriteError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct SqliteCollection {
    db: Arc<AsynaptixDb>,
    registry: Arc<ListenerRegistry>,
}

impl SqliteCollection {
    pub fn new(db: Arc<AsynaptixDb>) -> Self {
        Self {
            db,
            registry: ListenerRegistry::new(),
        }
    }
}

#[async_trait]
impl RemoteCollection for SqliteCollection {
    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Value,
        merge: bool,
    ) -> Result<(), WriteError> {
        self.db
            .upsert_document(collection, key, &document, merge)
            .map_err(WriteError::Storage)?;

        match self.db.list_documents(collection) {
            Ok(snapshot) => self.registry.emit(collection, RemoteEvent::Snapshot(snapshot)),
            Err(e) => {
                // The write landed but the feed cannot be refreshed.
                tracing::warn!("failed to read back '{collection}' snapshot: {e}");
                self.registry.emit(
                    collection,
                    RemoteEvent::Error(SubscriptionError::Interrupted(e.to_string())),
                );
            }
        }
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> RemoteSubscription {
        let (subscription, tx) = self.registry.register(collection);
        let initial = match self.db.list_documents(collection) {
            Ok(snapshot) => RemoteEvent::Snapshot(snapshot),
            Err(e) => RemoteEvent::Error(SubscriptionError::Unavailable(e.to_string())),
        };
        let _ = tx.send(initial);
        subscription
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn open_collection(path: &str) -> SqliteCollection {
        let _ = fs::remove_file(path);
        SqliteCollection::new(Arc::new(AsynaptixDb::open_at(path).unwrap()))
    }

    #[tokio::test]
    async fn test_upsert_pushes_snapshot_to_subscribers() {
        let path = ".asynaptix/test_sqlite_collection.db";
        let collection = open_collection(path);

        let mut feed = collection.subscribe("agents");
        match feed.recv().await {
            Some(RemoteEvent::Snapshot(docs)) => assert!(docs.is_empty()),
            other => panic!("expected empty initial snapshot, got {other:?}"),
        }

        collection
            .upsert("agents", "x", json!({ "id": "x", "rating": 4.5 }), true)
            .await
            .unwrap();
        match feed.recv().await {
            Some(RemoteEvent::Snapshot(docs)) => {
                assert_eq!(docs, vec![json!({ "id": "x", "rating": 4.5 })]);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_documents_survive_reopen() {
        let path = ".asynaptix/test_sqlite_reopen.db";
        {
            let collection = open_collection(path);
            collection
                .upsert("agents", "kept", json!({ "id": "kept" }), true)
                .await
                .unwrap();
        }

        let reopened = SqliteCollection::new(Arc::new(AsynaptixDb::open_at(path).unwrap()));
        let mut feed = reopened.subscribe("agents");
        match feed.recv().await {
            Some(RemoteEvent::Snapshot(docs)) => {
                assert_eq!(docs, vec![json!({ "id": "kept" })]);
            }
            other => panic!("expected persisted snapshot, got {other:?}"),
        }

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_merge_upsert_matches_contract() {
        let path = ".asynaptix/test_sqlite_merge.db";
        let collection = open_collection(path);

        collection
            .upsert("agents", "x", json!({ "id": "x", "rating": 4.5, "price": "free" }), true)
            .await
            .unwrap();
        collection
            .upsert("agents", "x", json!({ "id": "x", "price": "paid" }), true)
            .await
            .unwrap();

        let mut feed = collection.subscribe("agents");
        match feed.recv().await {
            Some(RemoteEvent::Snapshot(docs)) => {
                assert_eq!(docs[0]["rating"], 4.5);
                assert_eq!(docs[0]["price"], "paid");
            }
            other => panic!("expected snapshot, got {other:?}"),
        }

        let _ = fs::remove_file(path);
    }
}
