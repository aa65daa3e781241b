//! Freshness policy for cached records.

use chrono::{DateTime, Duration, Utc};

/// TTL for recipe details in the local tier (7 days).
pub const RECIPE_DETAILS_TTL: Duration = Duration::days(7);

/// TTL for recipe search results (3 days).
pub const RECIPE_SEARCH_TTL: Duration = Duration::days(3);

/// TTL for recommendation results (4 hours).
pub const RECOMMENDATION_TTL: Duration = Duration::hours(4);

/// Short reuse window for "is this still worth reusing" checks (1 hour).
pub const REUSE_WINDOW: Duration = Duration::hours(1);

/// TTL for resolved image URLs in the durable image layer (7 days).
pub const IMAGE_TTL: Duration = Duration::days(7);

/// Whether a record written at `written_at` is still fresh at `now`.
///
/// Fresh means strictly `now - written_at < ttl`. A record stamped in the
/// future (clock skew between installs) counts as fresh.
pub fn is_fresh(written_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(written_at) < ttl
}

/// A named TTL bound to one resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    ttl: Duration,
}

impl TtlPolicy {
    pub const fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub const fn recipe_details() -> Self {
        Self::new(RECIPE_DETAILS_TTL)
    }

    pub const fn recipe_search() -> Self {
        Self::new(RECIPE_SEARCH_TTL)
    }

    pub const fn recommendations() -> Self {
        Self::new(RECOMMENDATION_TTL)
    }

    pub const fn reuse_window() -> Self {
        Self::new(REUSE_WINDOW)
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_fresh(&self, written_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        is_fresh(written_at, self.ttl, now)
    }

    /// Oldest `written_at` still considered fresh at `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_just_inside_ttl_and_expired_just_past_it() {
        let t0 = Utc::now();
        let ttl = RECIPE_DETAILS_TTL;
        let one_ms = Duration::milliseconds(1);

        assert!(is_fresh(t0, ttl, t0 + ttl - one_ms));
        assert!(!is_fresh(t0, ttl, t0 + ttl + one_ms));
    }

    #[test]
    fn exactly_ttl_old_is_expired() {
        let t0 = Utc::now();
        assert!(!is_fresh(t0, RECOMMENDATION_TTL, t0 + RECOMMENDATION_TTL));
    }

    #[test]
    fn future_stamp_is_fresh() {
        let now = Utc::now();
        assert!(is_fresh(now + Duration::minutes(3), REUSE_WINDOW, now));
    }

    #[test]
    fn policy_cutoff_matches_freshness() {
        let now = Utc::now();
        let policy = TtlPolicy::recipe_search();
        let cutoff = policy.cutoff(now);

        assert!(!policy.is_fresh(cutoff, now));
        assert!(policy.is_fresh(cutoff + Duration::seconds(1), now));
    }
}
