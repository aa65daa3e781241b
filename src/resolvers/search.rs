//! Recipe search results: local -> generation.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use super::{ResolveOptions, Resolved, SearchSource, WriteBackQueue};
use crate::cache::{normalize_query, Clock, TtlPolicy};
use crate::database::{GeneratedPreview, RecipePreview, Store, StoreError};
use crate::error::SearchUnavailable;
use crate::generation::{GenerationGateway, GenerationRequest};
use crate::services::ImageLookup;

/// Resolves a free-text query to a list of recipe cards.
pub struct SearchResultResolver {
    local: Arc<dyn Store<Vec<RecipePreview>>>,
    generator: GenerationGateway<Vec<GeneratedPreview>>,
    images: Arc<dyn ImageLookup>,
    write_back: WriteBackQueue,
    clock: Arc<dyn Clock>,
    ttl: TtlPolicy,
}

impl SearchResultResolver {
    pub fn new(
        local: Arc<dyn Store<Vec<RecipePreview>>>,
        generator: GenerationGateway<Vec<GeneratedPreview>>,
        images: Arc<dyn ImageLookup>,
        write_back: WriteBackQueue,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            local,
            generator,
            images,
            write_back,
            clock,
            ttl: TtlPolicy::recipe_search(),
        }
    }

    /// Resolve search results for `query`.
    ///
    /// A blank query resolves to an empty list without touching any tier.
    pub async fn resolve_search_results(
        &self,
        query: &str,
        options: &ResolveOptions<SearchSource>,
    ) -> Result<Resolved<Vec<RecipePreview>, SearchSource>, SearchUnavailable> {
        let key = normalize_query(query);
        if key.is_empty() {
            return Ok(Resolved::new(Vec::new(), SearchSource::Cache));
        }

        if !options.force_refresh
            && let Some(previews) = self.check_local(&key).await
        {
            info!("Search '{}' served from {}", key, self.local.name());
            options.announce(SearchSource::Cache);
            return Ok(Resolved::new(previews, SearchSource::Cache));
        }

        options.announce(SearchSource::Api);
        let generated = self
            .generator
            .generate(&GenerationRequest::new(query.trim()))
            .await
            .map_err(|cause| SearchUnavailable {
                query: query.trim().to_string(),
                cause,
            })?;

        let previews = self.enrich(generated).await;
        self.write_back
            .put(Arc::clone(&self.local), key.clone(), previews.clone());

        info!("Search '{}' generated {} results", key, previews.len());
        Ok(Resolved::new(previews, SearchSource::Api))
    }

    async fn check_local(&self, key: &str) -> Option<Vec<RecipePreview>> {
        let Some(record) = self.local.get(key).await else {
            debug!("Search miss for '{}'", key);
            return None;
        };

        if !record.is_fresh(&self.ttl, self.clock.now()) {
            debug!("Search results for '{}' are stale", key);
            return None;
        }
        if record.value.is_empty() {
            debug!("Cached search for '{}' is empty, ignoring", key);
            return None;
        }
        Some(record.into_value())
    }

    async fn enrich(&self, generated: Vec<GeneratedPreview>) -> Vec<RecipePreview> {
        join_all(generated.into_iter().enumerate().map(|(index, hit)| async move {
            let keyword = if hit.english_name.trim().is_empty() {
                hit.dish_name.clone()
            } else {
                hit.english_name.clone()
            };
            let image_url = self.images.image_for(&keyword).await;
            RecipePreview::from_generated(index, hit, image_url)
        }))
        .await
    }

    /// Delete every cached search older than the search TTL.
    pub async fn clear_expired(&self) -> Result<u64, StoreError> {
        let cutoff = self.ttl.cutoff(self.clock.now());
        let mut removed = 0;
        for record in self.local.records().await? {
            if record.written_at <= cutoff && self.local.delete(&record.key).await? {
                removed += 1;
            }
        }
        info!("Removed {} expired searches", removed);
        Ok(removed)
    }

    pub async fn clear_all(&self) -> Result<u64, StoreError> {
        self.local.clear_all().await
    }
}
