//! Cache primitives shared by every resolver.
//!
//! ## Contents
//!
//! - `key` - Key normalization and dish slugs
//! - `ttl` - Freshness policy and per-resolver TTL constants
//! - `clock` - Injectable wall clock
//! - `record` - `CacheRecord<V>`, the typed row every store holds
//! - `TypedCache` - In-memory (Moka) layer with a bounded, owned lifetime
//!
//! ## Usage
//!
//! ```rust,ignore
//! let key = cache::composite_key("Quận 1", &["Romantic", "Hẹn hò"]);
//! let fresh = TtlPolicy::recommendations().is_fresh(record.written_at, clock.now());
//! ```

mod clock;
mod config;
mod key;
mod record;
mod ttl;
mod typed;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use key::{composite_key, normalize, normalize_query, slugify};
pub use record::{CacheRecord, Payload};
pub use ttl::{
    is_fresh, TtlPolicy, IMAGE_TTL, RECIPE_DETAILS_TTL, RECIPE_SEARCH_TTL, RECOMMENDATION_TTL,
    REUSE_WINDOW,
};
pub use typed::TypedCache;
