//! Dish photos from Unsplash, cached in memory and on disk.
//!
//! Lookup order is memory, then the durable image table, then the provider.
//! Only real provider hits are cached; the keyword placeholder is rebuilt on
//! every miss so a later call can still find a real photo.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{normalize_query, CacheConfig, Clock, TtlPolicy, TypedCache, IMAGE_TTL};
use crate::database::Store;

/// Placeholder used when even the keyword cannot be turned into a URL.
pub const GENERIC_PLACEHOLDER: &str = "https://loremflickr.com/800/600/food";

/// Resolves a photo URL for a keyword. Never fails.
#[async_trait]
pub trait ImageLookup: Send + Sync {
    async fn image_for(&self, keyword: &str) -> String;
}

/// Deterministic keyword-based placeholder photo.
pub fn placeholder_for(keyword: &str) -> String {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return GENERIC_PLACEHOLDER.to_string();
    }

    let Ok(mut url) = Url::parse("https://loremflickr.com/800/600") else {
        return GENERIC_PLACEHOLDER.to_string();
    };
    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments.push(keyword).push("food");
        }
        Err(()) => return GENERIC_PLACEHOLDER.to_string(),
    }
    url.into()
}

#[derive(Debug, Deserialize)]
struct SearchPhotos {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

/// Unsplash photo search behind two cache layers.
pub struct UnsplashImages {
    http: reqwest::Client,
    base_url: String,
    access_key: Option<String>,
    memory: TypedCache<String, String>,
    durable: Option<Arc<dyn Store<String>>>,
    clock: Arc<dyn Clock>,
    ttl: TtlPolicy,
}

impl UnsplashImages {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_key: Option<String>,
        durable: Option<Arc<dyn Store<String>>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            access_key,
            memory: TypedCache::new("image_urls", CacheConfig::image_urls()),
            durable,
            clock,
            ttl: TtlPolicy::new(IMAGE_TTL),
        }
    }

    async fn from_durable(&self, key: &str) -> Option<String> {
        let durable = self.durable.as_ref()?;
        let record = durable.get(key).await?;
        if record.is_fresh(&self.ttl, self.clock.now()) {
            Some(record.into_value())
        } else {
            None
        }
    }

    async fn search(&self, access_key: &str, keyword: &str) -> anyhow::Result<Option<String>> {
        let base = format!("{}/search/photos", self.base_url.trim_end_matches('/'));
        let url = Url::parse_with_params(
            &base,
            &[("query", keyword), ("per_page", "1"), ("orientation", "landscape")],
        )?;

        let found: SearchPhotos = self
            .http
            .get(url)
            .header("Authorization", format!("Client-ID {}", access_key))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(found.results.into_iter().next().map(|p| p.urls.regular))
    }

    async fn remember(&self, key: String, url: &str) {
        self.memory.insert(key.clone(), url.to_string());
        if let Some(durable) = &self.durable
            && let Err(e) = durable.put(&key, &url.to_string()).await
        {
            warn!("Failed to persist image for '{}': {}", key, e);
        }
    }
}

#[async_trait]
impl ImageLookup for UnsplashImages {
    async fn image_for(&self, keyword: &str) -> String {
        let key = normalize_query(keyword);
        if key.is_empty() {
            return GENERIC_PLACEHOLDER.to_string();
        }

        if let Some(url) = self.memory.get(&key) {
            return url;
        }

        if let Some(url) = self.from_durable(&key).await {
            self.memory.insert(key, url.clone());
            return url;
        }

        let Some(access_key) = self.access_key.as_deref() else {
            return placeholder_for(keyword);
        };

        match self.search(access_key, keyword).await {
            Ok(Some(url)) => {
                self.remember(key, &url).await;
                url
            }
            Ok(None) => {
                debug!("No photo found for '{}'", keyword);
                placeholder_for(keyword)
            }
            Err(e) => {
                warn!("Photo lookup for '{}' failed: {}", keyword, e);
                placeholder_for(keyword)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheRecord, ManualClock};
    use crate::database::MemoryStore;
    use chrono::Duration;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PHOTO: &str = "https://images.unsplash.com/photo-pho";

    async fn unsplash(expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .and(query_param("query", "beef pho"))
            .and(header("Authorization", "Client-ID key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "urls": { "regular": PHOTO } }]
            })))
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    fn images(
        server: &MockServer,
        durable: Option<Arc<dyn Store<String>>>,
        clock: Arc<ManualClock>,
    ) -> UnsplashImages {
        UnsplashImages::new(
            reqwest::Client::new(),
            server.uri(),
            Some("key".into()),
            durable,
            clock,
        )
    }

    #[test]
    fn placeholder_encodes_keyword() {
        assert_eq!(
            placeholder_for("banh mi"),
            "https://loremflickr.com/800/600/banh%20mi/food"
        );
        assert_eq!(placeholder_for("  "), GENERIC_PLACEHOLDER);
    }

    #[tokio::test]
    async fn hit_is_cached_in_both_layers() {
        let server = unsplash(1).await;
        let clock = Arc::new(ManualClock::default());
        let durable = Arc::new(MemoryStore::<String>::new("image_cache:", clock.clone()));
        let images = images(&server, Some(durable.clone() as Arc<dyn Store<String>>), clock);

        assert_eq!(images.image_for("beef pho").await, PHOTO);
        assert_eq!(images.image_for("Beef Pho").await, PHOTO);
        assert_eq!(durable.peek("beef pho").unwrap().value, PHOTO);
    }

    #[tokio::test]
    async fn durable_layer_answers_before_the_provider() {
        let server = unsplash(0).await;
        let clock = Arc::new(ManualClock::default());
        let durable = Arc::new(MemoryStore::<String>::new("image_cache:", clock.clone()));
        durable.seed(CacheRecord::new("beef pho", "https://cached/pho.jpg".to_string(), clock.now()));

        let images = images(&server, Some(durable as Arc<dyn Store<String>>), clock);
        assert_eq!(images.image_for("beef pho").await, "https://cached/pho.jpg");
    }

    #[tokio::test]
    async fn stale_durable_row_goes_back_to_the_provider() {
        let server = unsplash(1).await;
        let clock = Arc::new(ManualClock::default());
        let durable = Arc::new(MemoryStore::<String>::new("image_cache:", clock.clone()));
        durable.seed(CacheRecord::new(
            "beef pho",
            "https://old/pho.jpg".to_string(),
            clock.now() - IMAGE_TTL - Duration::minutes(1),
        ));

        let images = images(&server, Some(durable as Arc<dyn Store<String>>), clock);
        assert_eq!(images.image_for("beef pho").await, PHOTO);
    }

    #[tokio::test]
    async fn provider_failure_falls_back_without_caching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("rate limit"))
            .expect(2)
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::default());
        let durable = Arc::new(MemoryStore::<String>::new("image_cache:", clock.clone()));
        let images = images(&server, Some(durable.clone() as Arc<dyn Store<String>>), clock);

        let expected = placeholder_for("bun cha");
        assert_eq!(images.image_for("bun cha").await, expected);
        assert_eq!(images.image_for("bun cha").await, expected);
        assert!(durable.is_empty());
    }

    #[tokio::test]
    async fn missing_key_uses_placeholder() {
        let server = unsplash(0).await;
        let images = UnsplashImages::new(
            reqwest::Client::new(),
            server.uri(),
            None,
            None,
            Arc::new(ManualClock::default()),
        );

        assert_eq!(images.image_for("beef pho").await, placeholder_for("beef pho"));
    }
}
