//! Embedded on-device database (sled).

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::cache::{Clock, Payload};
use super::repository::SledStore;

/// Name of the tree every local namespace lives in.
const CACHE_TREE: &str = "food_buddy";

/// Durable key-value storage shared by all local cache namespaces.
#[derive(Debug, Clone)]
pub struct LocalDb {
    db: sled::Db,
    tree: sled::Tree,
}

impl LocalDb {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns error if the directory cannot be opened or is locked by another process.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let tree = db.open_tree(CACHE_TREE)?;
        info!("Opened local cache at {}", path.display());
        Ok(Self { db, tree })
    }

    /// In-memory database removed on drop.
    pub fn temporary() -> anyhow::Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let tree = db.open_tree(CACHE_TREE)?;
        Ok(Self { db, tree })
    }

    /// Raw tree shared by every namespace.
    pub fn tree(&self) -> &sled::Tree {
        &self.tree
    }

    /// A typed store over one key namespace of the shared tree.
    pub fn store<V: Payload>(&self, namespace: &str, clock: Arc<dyn Clock>) -> SledStore<V> {
        SledStore::new(self.tree.clone(), namespace, clock)
    }

    /// Flush pending writes to disk.
    pub async fn flush(&self) -> anyhow::Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}
