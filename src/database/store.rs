//! The contract every cache tier implements.

use async_trait::async_trait;
use thiserror::Error;

use crate::cache::{CacheRecord, Payload};

/// Failure inside a store.
///
/// Never crosses a resolver boundary: lookups absorb it as a miss and
/// write-backs log it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local store error: {0}")]
    Local(#[from] sled::Error),

    #[error("remote store error: {0}")]
    Remote(#[from] mongodb::error::Error),

    #[error("payload encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("remote document error: {0}")]
    Document(String),

    #[error("{store} did not answer within {millis}ms")]
    Timeout { store: String, millis: u64 },

    #[error("{0} is unavailable")]
    Unavailable(String),

    #[error("background store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A keyed table of `CacheRecord<V>` rows.
///
/// `get` never fails: an unreadable row or an unreachable backend is logged
/// and reported as absent. `put` is an upsert stamped with the store's clock.
#[async_trait]
pub trait Store<V: Payload>: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Option<CacheRecord<V>>;

    async fn put(&self, key: &str, value: &V) -> Result<(), StoreError>;

    /// Returns whether a row was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Remove every row this store owns. Returns the number removed.
    async fn clear_all(&self) -> Result<u64, StoreError>;

    /// Every readable row this store owns, fresh or not.
    async fn records(&self) -> Result<Vec<CacheRecord<V>>, StoreError>;
}
