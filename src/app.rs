//! Application state: every resolver wired from `Config`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{Clock, SystemClock};
use crate::config::Config;
use crate::database::{
    Database, GeneratedPreview, LocalDb, RawSuggestion, RecipeDetails, RecipePreview, Store,
    Suggestion,
};
use crate::generation::{GeminiClient, GenerationGateway};
use crate::resolvers::{
    RecipeResolver, RecommendationCache, RecommendationPipeline, RecommendationResolver,
    SearchResultResolver, WriteBackQueue, RECOMMENDATION_NAMESPACE,
};
use crate::services::{GoongPlaces, ImageLookup, PlaceLookup, UnsplashImages};

/// Local namespace of recipe details.
pub const RECIPE_NAMESPACE: &str = "recipe_cache:";
/// Local namespace of search results.
pub const SEARCH_NAMESPACE: &str = "search_cache:";
/// Local namespace of resolved image URLs.
pub const IMAGE_NAMESPACE: &str = "image_cache:";
/// Remote collection of shared recipes.
pub const RECIPE_COLLECTION: &str = "recipes";

/// Shared application state.
#[derive(Clone)]
pub struct FoodBuddy {
    /// Recipe details (local -> remote -> generation).
    pub recipes: Arc<RecipeResolver>,

    /// Recipe search results (local -> generation).
    pub search: Arc<SearchResultResolver>,

    /// Swipe-card recommendations.
    pub recommendations: Arc<RecommendationResolver>,

    /// Background cache writes.
    pub write_back: WriteBackQueue,

    local: LocalDb,
}

impl FoodBuddy {
    /// Open the local tier, connect the remote tier if configured, and build
    /// every resolver.
    ///
    /// # Errors
    /// Returns error if the local database cannot be opened. An unreachable
    /// remote tier only disables sharing.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let http = reqwest::Client::builder()
            .user_agent(concat!("food-buddy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let local = LocalDb::open(&config.local_db_path)?;
        let remote = connect_remote(config, clock.clone()).await;
        let write_back = WriteBackQueue::spawn();

        let gemini = Arc::new(GeminiClient::new(
            http.clone(),
            &config.gemini_base_url,
            &config.gemini_api_key,
            &config.gemini_model,
        ));
        info!("Generation model: {}", gemini.model());
        if config.gemini_api_key.is_empty() {
            warn!("GEMINI_API_KEY is not set, only cached results are available");
        }

        let image_store: Arc<dyn Store<String>> =
            Arc::new(local.store::<String>(IMAGE_NAMESPACE, clock.clone()));
        let images: Arc<dyn ImageLookup> = Arc::new(UnsplashImages::new(
            http.clone(),
            &config.unsplash_base_url,
            config.unsplash_access_key.clone(),
            Some(image_store),
            clock.clone(),
        ));
        let places: Arc<dyn PlaceLookup> = Arc::new(GoongPlaces::new(
            http,
            &config.goong_base_url,
            config.goong_api_key.clone(),
            config.search_radius_km,
        ));

        let policy = config.retry_policy();

        let recipes = RecipeResolver::new(
            Arc::new(local.store::<RecipeDetails>(RECIPE_NAMESPACE, clock.clone())),
            remote,
            GenerationGateway::<RecipeDetails>::with_policy(gemini.clone(), policy),
            images.clone(),
            write_back.clone(),
            clock.clone(),
        );

        let search = SearchResultResolver::new(
            Arc::new(local.store::<Vec<RecipePreview>>(SEARCH_NAMESPACE, clock.clone())),
            GenerationGateway::<Vec<GeneratedPreview>>::with_policy(gemini.clone(), policy),
            images.clone(),
            write_back.clone(),
            clock.clone(),
        );

        let recommendations = RecommendationResolver::new(
            RecommendationCache::new(
                Arc::new(local.store::<Vec<Suggestion>>(RECOMMENDATION_NAMESPACE, clock.clone())),
                clock,
            ),
            RecommendationPipeline::new(
                GenerationGateway::<Vec<RawSuggestion>>::with_policy(gemini, policy),
                places,
                images,
            ),
        );

        info!(
            "Food Buddy ready (remote tier: {})",
            if recipes.has_remote() { "on" } else { "off" }
        );

        Ok(Self {
            recipes: Arc::new(recipes),
            search: Arc::new(search),
            recommendations: Arc::new(recommendations),
            write_back,
            local,
        })
    }

    /// Finish queued cache writes and flush the local tier.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.write_back.drain().await;
        self.local.flush().await
    }
}

async fn connect_remote(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> Option<Arc<dyn Store<RecipeDetails>>> {
    let Some(uri) = config.mongodb_uri.as_deref() else {
        info!("MONGODB_URI not set, remote tier disabled");
        return None;
    };

    let db = match Database::connect(uri, &config.mongodb_database, config.remote_timeout).await {
        Ok(db) => db,
        Err(e) => {
            warn!("Remote tier unavailable, continuing without it: {}", e);
            return None;
        }
    };

    let store = db.store::<RecipeDetails>(RECIPE_COLLECTION, config.remote_timeout, clock);
    if let Err(e) = store.ensure_indexes().await {
        warn!("Could not create remote indexes: {}", e);
    }
    Some(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecipeUnavailable;
    use crate::generation::GenerationError;
    use crate::resolvers::ResolveOptions;

    #[tokio::test]
    async fn builds_without_remote_or_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.local_db_path = dir.path().join("cache.db").display().to_string();

        let app = FoodBuddy::from_config(&config).await.unwrap();
        assert!(!app.recipes.has_remote());

        let err = app
            .recipes
            .resolve_recipe("Phở Bò", &ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RecipeUnavailable::Generation {
                cause: GenerationError::NotConfigured(_),
                ..
            }
        ));

        app.shutdown().await.unwrap();
    }
}
