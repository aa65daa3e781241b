//! Local tier: one namespace of the embedded sled tree.
//!
//! Rows are JSON-encoded `CacheRecord<V>` under `<namespace><key>`. Several
//! stores share the same tree; each only ever touches its own prefix.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::{CacheRecord, Clock, Payload};
use crate::database::{Store, StoreError};

/// Local durable store for one resolver's table.
pub struct SledStore<V> {
    tree: sled::Tree,
    namespace: String,
    clock: Arc<dyn Clock>,
    _payload: PhantomData<fn() -> V>,
}

impl<V: Payload> SledStore<V> {
    /// `namespace` must be non-empty and unique per table.
    pub fn new(tree: sled::Tree, namespace: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tree,
            namespace: namespace.into(),
            clock,
            _payload: PhantomData,
        }
    }

    fn physical_key(&self, key: &str) -> Vec<u8> {
        let mut physical = Vec::with_capacity(self.namespace.len() + key.len());
        physical.extend_from_slice(self.namespace.as_bytes());
        physical.extend_from_slice(key.as_bytes());
        physical
    }

    fn decode(&self, key: &str, bytes: &[u8]) -> Option<CacheRecord<V>> {
        match serde_json::from_slice::<CacheRecord<V>>(bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Unreadable row '{}' in {}: {}", key, self.namespace, e);
                None
            }
        }
    }

    /// Number of physical rows in this namespace, readable or not.
    pub fn len(&self) -> usize {
        self.tree.scan_prefix(self.namespace.as_bytes()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<V: Payload> Store<V> for SledStore<V> {
    fn name(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, key: &str) -> Option<CacheRecord<V>> {
        match self.tree.get(self.physical_key(key)) {
            Ok(Some(bytes)) => self.decode(key, &bytes),
            Ok(None) => None,
            Err(e) => {
                warn!("Local read failed for '{}' in {}: {}", key, self.namespace, e);
                None
            }
        }
    }

    async fn put(&self, key: &str, value: &V) -> Result<(), StoreError> {
        let record = CacheRecord::new(key, value.clone(), self.clock.now());
        let bytes = serde_json::to_vec(&record)?;
        self.tree.insert(self.physical_key(key), bytes)?;
        debug!("Saved '{}' in {}", key, self.namespace);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let removed = self.tree.remove(self.physical_key(key))?.is_some();
        debug!("Deleted '{}' from {}: {}", key, self.namespace, removed);
        Ok(removed)
    }

    async fn clear_all(&self) -> Result<u64, StoreError> {
        let tree = self.tree.clone();
        let namespace = self.namespace.clone();
        let removed = tokio::task::spawn_blocking(move || -> Result<u64, sled::Error> {
            let mut removed = 0;
            for entry in tree.scan_prefix(namespace.as_bytes()).keys() {
                if tree.remove(entry?)?.is_some() {
                    removed += 1;
                }
            }
            Ok(removed)
        })
        .await??;
        debug!("Cleared {} rows from {}", removed, self.namespace);
        Ok(removed)
    }

    async fn records(&self) -> Result<Vec<CacheRecord<V>>, StoreError> {
        let tree = self.tree.clone();
        let prefix_len = self.namespace.len();
        let namespace = self.namespace.clone();
        let rows = tokio::task::spawn_blocking(move || {
            tree.scan_prefix(namespace.as_bytes())
                .collect::<Result<Vec<(sled::IVec, sled::IVec)>, sled::Error>>()
        })
        .await??;

        Ok(rows
            .iter()
            .filter_map(|(physical, bytes)| {
                let key = String::from_utf8_lossy(&physical[prefix_len..]);
                self.decode(&key, bytes)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::database::LocalDb;
    use chrono::Utc;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc::now()))
    }

    #[tokio::test]
    async fn put_is_upsert_and_stamps_clock() {
        let db = LocalDb::temporary().unwrap();
        let clock = clock();
        let store: SledStore<String> = db.store("recipe_cache:", clock.clone());

        store.put("pho-bo", &"first".to_string()).await.unwrap();
        clock.advance(chrono::Duration::minutes(10));
        store.put("pho-bo", &"second".to_string()).await.unwrap();

        let record = store.get("pho-bo").await.unwrap();
        assert_eq!(record.value, "second");
        assert_eq!(record.written_at, clock.now());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_row_reads_as_absent() {
        let db = LocalDb::temporary().unwrap();
        let store: SledStore<Vec<u32>> = db.store("search_cache:", clock());

        db.tree().insert("search_cache:broken", b"not json".to_vec()).unwrap();

        assert!(store.get("broken").await.is_none());
        assert!(store.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_all_only_touches_own_namespace() {
        let db = LocalDb::temporary().unwrap();
        let recipes: SledStore<String> = db.store("recipe_cache:", clock());
        let search: SledStore<String> = db.store("search_cache:", clock());

        recipes.put("a", &"1".to_string()).await.unwrap();
        recipes.put("b", &"2".to_string()).await.unwrap();
        search.put("a", &"3".to_string()).await.unwrap();

        assert_eq!(recipes.clear_all().await.unwrap(), 2);
        assert!(recipes.is_empty());
        assert_eq!(search.get("a").await.unwrap().value, "3");
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let db = LocalDb::temporary().unwrap();
        let store: SledStore<String> = db.store("recipe_cache:", clock());

        store.put("com-tam", &"x".to_string()).await.unwrap();
        assert!(store.delete("com-tam").await.unwrap());
        assert!(!store.delete("com-tam").await.unwrap());
        assert!(store.get("com-tam").await.is_none());
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        {
            let db = LocalDb::open(&path).unwrap();
            let store: SledStore<String> = db.store("recipe_cache:", clock());
            store.put("bun-cha", &"grilled pork".to_string()).await.unwrap();
            db.flush().await.unwrap();
        }

        let db = LocalDb::open(&path).unwrap();
        let store: SledStore<String> = db.store("recipe_cache:", clock());
        let records = store.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "bun-cha");
        assert_eq!(records[0].value, "grilled pork");
    }

    #[tokio::test]
    async fn bulk_scans_cover_every_row_in_namespace() {
        let db = LocalDb::temporary().unwrap();
        let recipes: SledStore<u32> = db.store("recipe_cache:", clock());
        let search: SledStore<u32> = db.store("search_cache:", clock());

        for i in 0..500 {
            recipes.put(&format!("dish-{}", i), &i).await.unwrap();
        }
        search.put("kept", &1).await.unwrap();

        assert_eq!(recipes.records().await.unwrap().len(), 500);
        assert_eq!(recipes.clear_all().await.unwrap(), 500);
        assert!(recipes.records().await.unwrap().is_empty());
        assert_eq!(search.records().await.unwrap().len(), 1);
    }
}
