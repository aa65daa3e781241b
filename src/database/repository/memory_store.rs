//! In-process store with call accounting.
//!
//! Stands in for either tier when no durable backend is wanted (dry runs,
//! offline mode) and lets callers observe exactly how a resolver used a tier.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::warn;

use crate::cache::{CacheRecord, Clock, Payload};
use crate::database::{Store, StoreError};

/// Per-operation call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub gets: usize,
    pub puts: usize,
    pub deletes: usize,
}

/// `DashMap`-backed store.
pub struct MemoryStore<V> {
    name: String,
    rows: DashMap<String, CacheRecord<V>>,
    clock: Arc<dyn Clock>,
    gets: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    unreachable: AtomicBool,
}

impl<V: Payload> MemoryStore<V> {
    pub fn new(name: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            rows: DashMap::new(),
            clock,
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Simulate a backend outage: reads miss and writes fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Place a row directly, bypassing the clock and the call counters.
    pub fn seed(&self, record: CacheRecord<V>) {
        self.rows.insert(record.key.clone(), record);
    }

    /// Read a row directly, bypassing freshness and the call counters.
    pub fn peek(&self, key: &str) -> Option<CacheRecord<V>> {
        self.rows.get(key).map(|r| r.value().clone())
    }

    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            gets: self.gets.load(Ordering::SeqCst),
            puts: self.puts.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(self.name.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl<V: Payload> Store<V> for MemoryStore<V> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Option<CacheRecord<V>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.check_reachable() {
            warn!("Lookup for '{}' failed, treating as miss: {}", key, e);
            return None;
        }
        self.peek(key)
    }

    async fn put(&self, key: &str, value: &V) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        self.rows.insert(
            key.to_string(),
            CacheRecord::new(key, value.clone(), self.clock.now()),
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        Ok(self.rows.remove(key).is_some())
    }

    async fn clear_all(&self) -> Result<u64, StoreError> {
        self.check_reachable()?;
        let removed = self.rows.len() as u64;
        self.rows.clear();
        Ok(removed)
    }

    async fn records(&self) -> Result<Vec<CacheRecord<V>>, StoreError> {
        self.check_reachable()?;
        Ok(self.rows.iter().map(|r| r.value().clone()).collect())
    }
}
