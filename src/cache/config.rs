//! In-memory cache configuration.

use std::time::Duration;

/// Configuration for an in-memory cache layer.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries kept in memory.
    pub max_capacity: u64,

    /// Time-to-live for entries.
    /// `None` keeps entries for the lifetime of the process (until evicted by capacity).
    pub ttl: Option<Duration>,

    /// Time-to-idle for entries.
    pub tti: Option<Duration>,
}

impl CacheConfig {
    /// Memory layer for resolved image URLs.
    /// Process-lifetime; the durable layer below it owns expiry.
    pub fn image_urls() -> Self {
        Self {
            max_capacity: 2_000,
            ttl: None,
            tti: None,
        }
    }
}
