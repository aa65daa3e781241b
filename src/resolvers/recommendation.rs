//! Recommendation results: one composite-key cache in front of the pipeline.

use std::sync::Arc;

use tracing::{info, warn};

use super::tiered::{Tier, TieredStore};
use super::{RecommendationPipeline, RecommendationSource, ResolveOptions, Resolved};
use crate::cache::{composite_key, Clock, TtlPolicy};
use crate::database::{Coordinates, Store, StoreError, Suggestion};
use crate::error::NoResultsAvailable;

/// Key prefix of every recommendation row in the local database.
pub const RECOMMENDATION_NAMESPACE: &str = "food_buddy_cache_";

/// TTL-bounded cache keyed by location and scenario tags.
///
/// Expired rows are deleted when read, so a stale entry never lingers past
/// the first lookup that finds it.
pub struct RecommendationCache {
    store: Arc<dyn Store<Vec<Suggestion>>>,
    tiers: TieredStore<Vec<Suggestion>>,
}

impl RecommendationCache {
    /// `store` must be scoped to [`RECOMMENDATION_NAMESPACE`].
    pub fn new(store: Arc<dyn Store<Vec<Suggestion>>>, clock: Arc<dyn Clock>) -> Self {
        let tiers = TieredStore::new(clock).tier(
            Tier::fresh_within(Arc::clone(&store), TtlPolicy::recommendations()).evict_expired(),
        );
        Self { store, tiers }
    }

    pub fn key<S: AsRef<str>>(location: &str, tags: &[S]) -> String {
        composite_key(location, tags)
    }

    pub async fn get<S: AsRef<str>>(&self, location: &str, tags: &[S]) -> Option<Vec<Suggestion>> {
        let key = Self::key(location, tags);
        if key.is_empty() {
            return None;
        }
        self.tiers.lookup(&key).await.map(|hit| hit.value)
    }

    #[allow(clippy::ptr_arg)]
    pub async fn put<S: AsRef<str>>(
        &self,
        location: &str,
        tags: &[S],
        suggestions: &Vec<Suggestion>,
    ) -> Result<(), StoreError> {
        let key = Self::key(location, tags);
        if key.is_empty() {
            return Ok(());
        }
        self.store.put(&key, suggestions).await
    }

    pub async fn invalidate<S: AsRef<str>>(&self, location: &str, tags: &[S]) -> Result<bool, StoreError> {
        let key = Self::key(location, tags);
        if key.is_empty() {
            return Ok(false);
        }
        self.store.delete(&key).await
    }

    /// Remove every recommendation row, and nothing else.
    pub async fn clear(&self) -> Result<u64, StoreError> {
        let removed = self.store.clear_all().await?;
        info!("Cleared {} cached recommendations", removed);
        Ok(removed)
    }
}

/// Cache-first recommendations.
pub struct RecommendationResolver {
    cache: Arc<RecommendationCache>,
    pipeline: Arc<RecommendationPipeline>,
}

impl RecommendationResolver {
    pub fn new(cache: RecommendationCache, pipeline: RecommendationPipeline) -> Self {
        Self {
            cache: Arc::new(cache),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn cache(&self) -> &RecommendationCache {
        &self.cache
    }

    /// Swipe cards for `location` and `tags`, seen from `origin`.
    ///
    /// A blank location resolves to an empty list without touching the cache.
    /// The pipeline and the cache write run on their own task, so the result
    /// is cached even if the caller stops waiting.
    pub async fn resolve_recommendations<S: AsRef<str>>(
        &self,
        location: &str,
        tags: &[S],
        origin: Coordinates,
        options: &ResolveOptions<RecommendationSource>,
    ) -> Result<Resolved<Vec<Suggestion>, RecommendationSource>, NoResultsAvailable> {
        if RecommendationCache::key(location, tags).is_empty() {
            return Ok(Resolved::new(Vec::new(), RecommendationSource::Cache));
        }

        if !options.force_refresh
            && let Some(cached) = self.cache.get(location, tags).await
            && !cached.is_empty()
        {
            info!("Recommendations for '{}' served from cache", location.trim());
            options.announce(RecommendationSource::Cache);
            return Ok(Resolved::new(cached, RecommendationSource::Cache));
        }

        options.announce(RecommendationSource::Generation);
        let task = tokio::spawn(generate_and_cache(
            Arc::clone(&self.cache),
            Arc::clone(&self.pipeline),
            location.to_string(),
            tags.iter().map(|t| t.as_ref().to_string()).collect(),
            origin,
        ));
        let suggestions = task
            .await
            .map_err(|e| NoResultsAvailable::Generation(e.into()))??;

        info!(
            "Generated {} recommendations for '{}'",
            suggestions.len(),
            location.trim()
        );
        Ok(Resolved::new(suggestions, RecommendationSource::Generation))
    }
}

async fn generate_and_cache(
    cache: Arc<RecommendationCache>,
    pipeline: Arc<RecommendationPipeline>,
    location: String,
    tags: Vec<String>,
    origin: Coordinates,
) -> Result<Vec<Suggestion>, NoResultsAvailable> {
    let suggestions = pipeline.run(&location, &tags, origin).await?;
    if let Err(e) = cache.put(&location, &tags, &suggestions).await {
        warn!("Failed to cache recommendations for '{}': {}", location.trim(), e);
    }
    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::database::{LocalDb, MemoryStore, RawSuggestion, SledStore};
    use crate::generation::{GenerationError, GenerationGateway, RetryPolicy};
    use crate::testing::{
        idea, place, RecordingSleeper, ScriptedGenerator, SlowStore, StaticImages, StaticPlaces,
    };
    use chrono::Duration;

    const ORIGIN: Coordinates = Coordinates::new(10.7769, 106.7009);

    struct Harness {
        db: LocalDb,
        store: Arc<SledStore<Vec<Suggestion>>>,
        generator: Arc<ScriptedGenerator<Vec<RawSuggestion>>>,
        clock: Arc<ManualClock>,
        resolver: RecommendationResolver,
    }

    fn harness(generator: ScriptedGenerator<Vec<RawSuggestion>>) -> Harness {
        let db = LocalDb::temporary().unwrap();
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(db.store(RECOMMENDATION_NAMESPACE, clock.clone()));
        let generator = Arc::new(generator);
        let pipeline = RecommendationPipeline::new(
            GenerationGateway::new(
                generator.clone(),
                RetryPolicy::default(),
                Arc::new(RecordingSleeper::default()),
            ),
            Arc::new(StaticPlaces::default().with("Phở Hòa", place("goong-1", "Phở Hòa", None))),
            Arc::new(StaticImages::default()),
        );
        let resolver = RecommendationResolver::new(
            RecommendationCache::new(store.clone(), clock.clone()),
            pipeline,
        );
        Harness {
            db,
            store,
            generator,
            clock,
            resolver,
        }
    }

    fn ideas() -> Vec<RawSuggestion> {
        vec![idea("Phở", "Phở Hòa"), idea("Ốc", "Ốc Oanh Vĩnh Khánh")]
    }

    fn options() -> ResolveOptions<RecommendationSource> {
        ResolveOptions::default()
    }

    #[tokio::test]
    async fn tag_order_and_case_share_one_entry() {
        let h = harness(ScriptedGenerator::always(ideas()));

        let first = h
            .resolver
            .resolve_recommendations("Quận 1", &["Hẹn hò", "Romantic"], ORIGIN, &options())
            .await
            .unwrap();
        let second = h
            .resolver
            .resolve_recommendations("quận 1", &["romantic", "hẹn hò"], ORIGIN, &options())
            .await
            .unwrap();

        assert_eq!(first.source, RecommendationSource::Generation);
        assert_eq!(second.source, RecommendationSource::Cache);
        assert_eq!(first.value, second.value);
        assert_eq!(h.generator.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_deleted_on_read() {
        let h = harness(ScriptedGenerator::always(ideas()));
        h.resolver
            .resolve_recommendations("Quận 1", &["Hẹn hò"], ORIGIN, &options())
            .await
            .unwrap();
        assert_eq!(h.store.len(), 1);

        h.clock.advance(Duration::hours(4) + Duration::minutes(1));
        assert!(h.resolver.cache().get("Quận 1", &["Hẹn hò"]).await.is_none());
        assert_eq!(h.store.len(), 0);
    }

    #[tokio::test]
    async fn expired_entry_is_regenerated_and_rewritten() {
        let h = harness(ScriptedGenerator::always(ideas()));
        h.resolver
            .resolve_recommendations("Quận 1", &["Hẹn hò"], ORIGIN, &options())
            .await
            .unwrap();

        h.clock.advance(Duration::hours(4) + Duration::minutes(1));
        let again = h
            .resolver
            .resolve_recommendations("Quận 1", &["Hẹn hò"], ORIGIN, &options())
            .await
            .unwrap();

        assert_eq!(again.source, RecommendationSource::Generation);
        assert_eq!(h.generator.calls(), 2);
        let record = h.store.get("quận1_hẹn hò").await.unwrap();
        assert_eq!(record.written_at, h.clock.now());
    }

    #[tokio::test]
    async fn force_refresh_heals_the_entry() {
        let h = harness(ScriptedGenerator::script(vec![
            Ok(vec![idea("Phở", "Phở Hòa")]),
            Ok(ideas()),
        ]));
        h.resolver
            .resolve_recommendations("Quận 1", &["Hẹn hò"], ORIGIN, &options())
            .await
            .unwrap();

        let forced = h
            .resolver
            .resolve_recommendations("Quận 1", &["Hẹn hò"], ORIGIN, &ResolveOptions::refresh(true))
            .await
            .unwrap();
        let cached = h
            .resolver
            .resolve_recommendations("Quận 1", &["Hẹn hò"], ORIGIN, &options())
            .await
            .unwrap();

        assert_eq!(forced.value.len(), 2);
        assert_eq!(cached.source, RecommendationSource::Cache);
        assert_eq!(cached.value, forced.value);
    }

    #[tokio::test]
    async fn failure_leaves_the_cache_alone() {
        let h = harness(ScriptedGenerator::failing(GenerationError::Empty));

        let err = h
            .resolver
            .resolve_recommendations("Quận 1", &["Hẹn hò"], ORIGIN, &options())
            .await
            .unwrap_err();

        assert!(matches!(err, NoResultsAvailable::Generation(_)));
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn clear_is_scoped_to_recommendations() {
        let h = harness(ScriptedGenerator::always(ideas()));
        let recipes: SledStore<String> = h.db.store("recipe_cache:", h.clock.clone());
        recipes.put("pho-bo", &"kept".to_string()).await.unwrap();
        h.store
            .put("quận1_hẹn hò", &Vec::new())
            .await
            .unwrap();
        h.store
            .put("quận3_ăn khuya", &Vec::new())
            .await
            .unwrap();

        assert_eq!(h.resolver.cache().clear().await.unwrap(), 2);
        assert!(h.store.is_empty());
        assert_eq!(recipes.get("pho-bo").await.unwrap().value, "kept");
    }

    #[tokio::test]
    async fn blank_location_touches_nothing() {
        let h = harness(ScriptedGenerator::always(ideas()));

        let resolved = h
            .resolver
            .resolve_recommendations("  ", &["Hẹn hò"], ORIGIN, &options())
            .await
            .unwrap();

        assert!(resolved.value.is_empty());
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn invalidate_drops_one_key() {
        let h = harness(ScriptedGenerator::always(ideas()));
        let now = h.clock.now();
        let cache = h.resolver.cache();
        h.store.put("quận1_hẹn hò", &Vec::new()).await.unwrap();
        h.store.put("quận1_romantic", &Vec::new()).await.unwrap();

        assert!(cache.invalidate("Quận 1", &["Hẹn hò"]).await.unwrap());
        assert_eq!(h.store.len(), 1);
        assert_eq!(h.store.get("quận1_romantic").await.unwrap().written_at, now);
    }

    #[tokio::test]
    async fn abandoned_caller_still_caches_generated_recommendations() {
        let clock = Arc::new(ManualClock::default());
        let rows = Arc::new(MemoryStore::new(RECOMMENDATION_NAMESPACE, clock.clone()));
        let generator = Arc::new(ScriptedGenerator::always(ideas()));
        let pipeline = RecommendationPipeline::new(
            GenerationGateway::new(
                generator.clone(),
                RetryPolicy::default(),
                Arc::new(RecordingSleeper::default()),
            ),
            Arc::new(StaticPlaces::default()),
            Arc::new(StaticImages::default()),
        );
        let slow = SlowStore::new(rows.clone(), std::time::Duration::from_millis(50));
        let resolver = RecommendationResolver::new(
            RecommendationCache::new(Arc::new(slow), clock.clone()),
            pipeline,
        );

        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            resolver.resolve_recommendations("Quận 1", &["Hẹn hò"], ORIGIN, &options()),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert_eq!(generator.calls(), 1);
        assert_eq!(rows.peek("quận1_hẹn hò").unwrap().value.len(), 2);
    }
}
