//! Typed cache records.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::TtlPolicy;

/// Bound for anything a store can hold.
pub trait Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// One row of a cache table.
///
/// `key` is the single-row primary key inside its store; writes replace the
/// whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord<V> {
    pub key: String,
    pub value: V,
    pub written_at: DateTime<Utc>,
}

impl<V> CacheRecord<V> {
    pub fn new(key: impl Into<String>, value: V, written_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value,
            written_at,
        }
    }

    /// Whether this record is still valid under `policy` at `now`.
    pub fn is_fresh(&self, policy: &TtlPolicy, now: DateTime<Utc>) -> bool {
        policy.is_fresh(self.written_at, now)
    }

    pub fn into_value(self) -> V {
        self.value
    }
}
