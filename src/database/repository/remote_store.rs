//! Remote shared tier: one MongoDB collection shared by every install.
//!
//! Documents look like `{ key, payload, written_at_ms }` with a unique index
//! on `key`. Every call is bounded by a timeout; an unreachable cluster is a
//! miss, never an error for the caller.

use std::future::IntoFuture;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{IndexOptions, ReplaceOptions};
use mongodb::{Collection, IndexModel};
use tracing::{debug, warn};

use crate::cache::{CacheRecord, Clock, Payload};
use crate::database::{Store, StoreError};

/// Shared network store for one table.
pub struct MongoStore<V> {
    collection: Collection<Document>,
    name: String,
    timeout: Duration,
    clock: Arc<dyn Clock>,
    _payload: PhantomData<fn() -> V>,
}

impl<V: Payload> MongoStore<V> {
    pub fn new(collection: Collection<Document>, timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        let name = format!("remote:{}", collection.name());
        Self {
            collection,
            name,
            timeout,
            clock,
            _payload: PhantomData,
        }
    }

    /// Create the unique index on `key`. Idempotent.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "key": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.bounded(self.collection.create_index(index)).await?;
        Ok(())
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StoreError::Timeout {
                store: self.name.clone(),
                millis: self.timeout.as_millis() as u64,
            }),
        }
    }
}

/// Encode a record as a remote document.
pub(crate) fn encode<V: Payload>(record: &CacheRecord<V>) -> Result<Document, StoreError> {
    let payload = bson::to_bson(&record.value).map_err(|e| StoreError::Document(e.to_string()))?;
    Ok(doc! {
        "key": &record.key,
        "payload": payload,
        "written_at_ms": record.written_at.timestamp_millis(),
    })
}

/// Decode a remote document into a record.
pub(crate) fn decode<V: Payload>(document: Document) -> Result<CacheRecord<V>, StoreError> {
    let key = document
        .get_str("key")
        .map_err(|e| StoreError::Document(e.to_string()))?
        .to_string();
    let millis = document
        .get_i64("written_at_ms")
        .map_err(|e| StoreError::Document(e.to_string()))?;
    let written_at = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Document(format!("timestamp out of range: {}", millis)))?;
    let payload = document
        .get("payload")
        .cloned()
        .ok_or_else(|| StoreError::Document("missing payload".to_string()))?;
    let value = bson::from_bson(payload).map_err(|e| StoreError::Document(e.to_string()))?;

    Ok(CacheRecord::new(key, value, written_at))
}

#[async_trait]
impl<V: Payload> Store<V> for MongoStore<V> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Option<CacheRecord<V>> {
        let found = match self.bounded(self.collection.find_one(doc! { "key": key })).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Remote lookup for '{}' failed, treating as miss: {}", key, e);
                return None;
            }
        };

        match found.map(decode::<V>) {
            Some(Ok(record)) => Some(record),
            Some(Err(e)) => {
                warn!("Unreadable remote document '{}' in {}: {}", key, self.name, e);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, value: &V) -> Result<(), StoreError> {
        let record = CacheRecord::new(key, value.clone(), self.clock.now());
        let document = encode(&record)?;
        let options = ReplaceOptions::builder().upsert(true).build();

        self.bounded(
            self.collection
                .replace_one(doc! { "key": key }, document)
                .with_options(options),
        )
        .await?;

        debug!("Saved '{}' in {}", key, self.name);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let result = self.bounded(self.collection.delete_one(doc! { "key": key })).await?;
        Ok(result.deleted_count > 0)
    }

    async fn clear_all(&self) -> Result<u64, StoreError> {
        let result = self.bounded(self.collection.delete_many(doc! {})).await?;
        debug!("Cleared {} documents from {}", result.deleted_count, self.name);
        Ok(result.deleted_count)
    }

    async fn records(&self) -> Result<Vec<CacheRecord<V>>, StoreError> {
        let mut cursor = self.bounded(self.collection.find(doc! {})).await?;
        let mut records = Vec::new();

        while let Some(result) = cursor.next().await {
            match result.map_err(StoreError::from).and_then(decode::<V>) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable document in {}: {}", self.name, e),
            }
        }

        Ok(records)
    }
}
