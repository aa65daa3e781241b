//! An ordered list of stores consulted fastest-first.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use super::WriteBackQueue;
use crate::cache::{Clock, Payload, TtlPolicy};
use crate::database::Store;

/// One store plus the rule deciding whether its rows may answer.
pub struct Tier<V> {
    store: Arc<dyn Store<V>>,
    ttl: Option<TtlPolicy>,
    evict_expired: bool,
}

impl<V> Clone for Tier<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ttl: self.ttl,
            evict_expired: self.evict_expired,
        }
    }
}

impl<V: Payload> Tier<V> {
    /// Rows answer only while fresh under `ttl`.
    pub fn fresh_within(store: Arc<dyn Store<V>>, ttl: TtlPolicy) -> Self {
        Self {
            store,
            ttl: Some(ttl),
            evict_expired: false,
        }
    }

    /// Any row answers, whatever its age.
    pub fn authoritative(store: Arc<dyn Store<V>>) -> Self {
        Self {
            store,
            ttl: None,
            evict_expired: false,
        }
    }

    /// Delete expired rows as soon as a lookup finds them.
    #[must_use]
    pub fn evict_expired(mut self) -> Self {
        self.evict_expired = true;
        self
    }

    pub fn store(&self) -> &Arc<dyn Store<V>> {
        &self.store
    }
}

/// A hit and the position of the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TierHit<V> {
    pub value: V,
    pub tier: usize,
}

/// Stores in priority order. Lookups stop at the first tier with a usable row.
pub struct TieredStore<V> {
    tiers: Vec<Tier<V>>,
    clock: Arc<dyn Clock>,
}

impl<V> Clone for TieredStore<V> {
    fn clone(&self) -> Self {
        Self {
            tiers: self.tiers.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<V: Payload> TieredStore<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tiers: Vec::new(),
            clock,
        }
    }

    /// Append a tier below the existing ones.
    #[must_use]
    pub fn tier(mut self, tier: Tier<V>) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Store at `index`, fastest first.
    pub fn store(&self, index: usize) -> Option<&Arc<dyn Store<V>>> {
        self.tiers.get(index).map(Tier::store)
    }

    /// First usable row for `key`, checking tiers strictly in order.
    pub async fn lookup(&self, key: &str) -> Option<TierHit<V>> {
        for (index, tier) in self.tiers.iter().enumerate() {
            let Some(record) = tier.store.get(key).await else {
                debug!("Miss for '{}' in {}", key, tier.store.name());
                continue;
            };

            let fresh = tier
                .ttl
                .is_none_or(|ttl| record.is_fresh(&ttl, self.clock.now()));
            if fresh {
                debug!("Hit for '{}' in {}", key, tier.store.name());
                return Some(TierHit {
                    value: record.into_value(),
                    tier: index,
                });
            }

            debug!(
                "Stale row for '{}' in {} (written {})",
                key,
                tier.store.name(),
                record.written_at
            );
            if tier.evict_expired
                && let Err(e) = tier.store.delete(key).await
            {
                warn!("Failed to drop stale '{}' from {}: {}", key, tier.store.name(), e);
            }
        }
        None
    }

    /// Write `value` to every tier in parallel. Failures are logged per tier.
    pub async fn put_all(&self, key: &str, value: &V) {
        join_all(self.tiers.iter().map(|tier| async move {
            if let Err(e) = tier.store.put(key, value).await {
                warn!("Failed to write '{}' to {}: {}", key, tier.store.name(), e);
            }
        }))
        .await;
    }

    /// Queue `value` into every tier faster than `hit_tier`.
    pub fn write_back_above(&self, queue: &WriteBackQueue, hit_tier: usize, key: &str, value: &V) {
        for tier in self.tiers.iter().take(hit_tier) {
            queue.put(Arc::clone(&tier.store), key, value.clone());
        }
    }
}
