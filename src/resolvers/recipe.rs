//! Recipe details: local -> remote -> generation.

use std::sync::Arc;

use tracing::info;

use super::tiered::{Tier, TieredStore};
use super::{RecipeSource, ResolveOptions, Resolved, WriteBackQueue};
use crate::cache::{slugify, CacheRecord, Clock, TtlPolicy};
use crate::database::{RecipeDetails, Store, StoreError};
use crate::error::RecipeUnavailable;
use crate::generation::{GenerationError, GenerationGateway, GenerationRequest};
use crate::services::ImageLookup;

const LOCAL_TIER: usize = 0;

/// Resolves full recipes by dish name.
///
/// The remote tier is optional; without it the resolver behaves as a
/// two-tier cache.
pub struct RecipeResolver {
    local: Arc<dyn Store<RecipeDetails>>,
    tiers: TieredStore<RecipeDetails>,
    generator: GenerationGateway<RecipeDetails>,
    images: Arc<dyn ImageLookup>,
    write_back: WriteBackQueue,
    clock: Arc<dyn Clock>,
}

impl RecipeResolver {
    pub fn new(
        local: Arc<dyn Store<RecipeDetails>>,
        remote: Option<Arc<dyn Store<RecipeDetails>>>,
        generator: GenerationGateway<RecipeDetails>,
        images: Arc<dyn ImageLookup>,
        write_back: WriteBackQueue,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut tiers = TieredStore::new(Arc::clone(&clock))
            .tier(Tier::fresh_within(Arc::clone(&local), TtlPolicy::recipe_details()));
        // The shared tier is refreshed centrally, so any hit counts.
        if let Some(remote) = remote {
            tiers = tiers.tier(Tier::authoritative(remote));
        }

        Self {
            local,
            tiers,
            generator,
            images,
            write_back,
            clock,
        }
    }

    pub fn has_remote(&self) -> bool {
        self.tiers.len() > 1
    }

    /// Resolve a recipe, reporting which tier answered.
    ///
    /// Generation and the saves that follow it run on their own task, so a
    /// caller that gives up early still leaves the recipe cached.
    ///
    /// # Errors
    /// `RecipeUnavailable` when the dish name is blank or generation fails.
    /// Store failures never surface here.
    pub async fn resolve_recipe(
        &self,
        dish_name: &str,
        options: &ResolveOptions<RecipeSource>,
    ) -> Result<Resolved<RecipeDetails, RecipeSource>, RecipeUnavailable> {
        let slug = slugify(dish_name);
        if slug.is_empty() {
            return Err(RecipeUnavailable::EmptyDishName);
        }

        if options.force_refresh {
            info!("Force refresh for '{}', skipping caches", dish_name);
        } else if let Some(hit) = self.tiers.lookup(&slug).await {
            let source = if hit.tier == LOCAL_TIER {
                RecipeSource::Local
            } else {
                self.tiers
                    .write_back_above(&self.write_back, hit.tier, &slug, &hit.value);
                RecipeSource::Remote
            };
            info!("Recipe '{}' served from {:?} tier", slug, source);
            options.announce(source);
            return Ok(Resolved::new(hit.value, source));
        }

        options.announce(RecipeSource::Generation);
        let dish = dish_name.trim().to_string();
        let task = tokio::spawn(generate_and_save(
            self.tiers.clone(),
            self.generator.clone(),
            Arc::clone(&self.images),
            dish.clone(),
            slug.clone(),
        ));
        let recipe = task
            .await
            .map_err(GenerationError::from)
            .and_then(|generated| generated)
            .map_err(|cause| RecipeUnavailable::Generation { dish, cause })?;

        info!("Recipe '{}' generated", slug);
        Ok(Resolved::new(recipe, RecipeSource::Generation))
    }

    /// Whether `dish_name` was cached locally within the reuse window.
    pub async fn is_recently_cached(&self, dish_name: &str) -> bool {
        let slug = slugify(dish_name);
        if slug.is_empty() {
            return false;
        }
        self.local
            .get(&slug)
            .await
            .is_some_and(|record| record.is_fresh(&TtlPolicy::reuse_window(), self.clock.now()))
    }

    /// Drop one dish from the local tier.
    pub async fn delete_cached(&self, dish_name: &str) -> Result<bool, StoreError> {
        let slug = slugify(dish_name);
        if slug.is_empty() {
            return Ok(false);
        }
        self.local.delete(&slug).await
    }

    pub async fn clear_local(&self) -> Result<u64, StoreError> {
        let removed = self.local.clear_all().await?;
        info!("Cleared {} cached recipes", removed);
        Ok(removed)
    }

    /// Every locally cached recipe, newest first.
    pub async fn cached_recipes(&self) -> Result<Vec<CacheRecord<RecipeDetails>>, StoreError> {
        let mut records = self.local.records().await?;
        records.sort_by(|a, b| b.written_at.cmp(&a.written_at));
        Ok(records)
    }
}

async fn generate_and_save(
    tiers: TieredStore<RecipeDetails>,
    generator: GenerationGateway<RecipeDetails>,
    images: Arc<dyn ImageLookup>,
    dish: String,
    slug: String,
) -> Result<RecipeDetails, GenerationError> {
    let mut recipe = generator.generate(&GenerationRequest::new(dish)).await?;
    if recipe.image_url.is_none() {
        recipe.image_url = Some(images.image_for(recipe.image_keyword()).await);
    }
    tiers.put_all(&slug, &recipe).await;
    Ok(recipe)
}
