//! Storage substrates and the cache tiers built on them.
//!
//! - `LocalDb` - embedded sled database, the fast on-device tier
//! - `Database` - MongoDB, the shared remote tier
//! - `Store` - get/put/delete/clear contract every tier implements

pub mod models;
mod local;
mod mongo;
pub mod repository;
mod store;

pub use local::LocalDb;
pub use models::*;
pub use mongo::Database;
pub use repository::{MemoryStore, MongoStore, SledStore, StoreCalls};
pub use store::{Store, StoreError};
