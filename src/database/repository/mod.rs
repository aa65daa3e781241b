//! Store adapters - one `Store` contract, several backends.

mod local_store;
mod memory_store;
mod remote_store;

pub use local_store::SledStore;
pub use memory_store::{MemoryStore, StoreCalls};
pub use remote_store::MongoStore;
