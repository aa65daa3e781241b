//! Test doubles shared across module tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::cache::{CacheRecord, Payload};
use crate::database::{
    Coordinates, MemoryStore, Store, StoreError, IngredientItem, PlaceRecord, RawSuggestion, RecipeDetails, RecipeMeta, StepItem,
    StepTimer,
};
use crate::generation::{GenerationError, GenerationRequest, Generator, Sleeper};
use crate::services::{ImageLookup, PlaceLookup};

pub fn throttled() -> GenerationError {
    GenerationError::RateLimited {
        status: 429,
        message: "resource exhausted".to_string(),
    }
}

/// Generator that plays back a fixed script of outcomes.
pub struct ScriptedGenerator<V> {
    script: Mutex<VecDeque<Result<V, GenerationError>>>,
    fallback: Option<V>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicUsize,
}

impl<V: Clone + Send + Sync> ScriptedGenerator<V> {
    pub fn script(outcomes: Vec<Result<V, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always succeeds with `value`.
    pub fn always(value: V) -> Self {
        Self {
            fallback: Some(value),
            ..Self::script(Vec::new())
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self::script(vec![Err(error)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl<V: Clone + Send + Sync> Generator<V> for ScriptedGenerator<V> {
    async fn generate(&self, request: &GenerationRequest) -> Result<V, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if let Some(next) = self.script.lock().pop_front() {
            return next;
        }
        match &self.fallback {
            Some(value) => Ok(value.clone()),
            None => Err(GenerationError::Malformed("script exhausted".to_string())),
        }
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}

/// Image lookup answering `https://img.test/<keyword>`.
#[derive(Debug, Default)]
pub struct StaticImages {
    calls: AtomicUsize,
}

impl StaticImages {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageLookup for StaticImages {
    async fn image_for(&self, keyword: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        format!("https://img.test/{}", keyword.replace(' ', "-"))
    }
}

/// Place lookup backed by a fixed query -> place table.
#[derive(Debug, Default)]
pub struct StaticPlaces {
    places: HashMap<String, PlaceRecord>,
}

impl StaticPlaces {
    #[must_use]
    pub fn with(mut self, query: &str, place: PlaceRecord) -> Self {
        self.places.insert(query.to_string(), place);
        self
    }
}

#[async_trait]
impl PlaceLookup for StaticPlaces {
    async fn find_nearby_or_by_name(&self, query: &str, _origin: Coordinates) -> Option<PlaceRecord> {
        self.places.get(query).cloned()
    }
}

/// Store whose writes take `delay` before landing in `inner`.
pub struct SlowStore<V> {
    inner: Arc<MemoryStore<V>>,
    delay: Duration,
}

impl<V: Payload> SlowStore<V> {
    pub fn new(inner: Arc<MemoryStore<V>>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<V: Payload> Store<V> for SlowStore<V> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &str) -> Option<CacheRecord<V>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &V) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.delete(key).await
    }

    async fn clear_all(&self) -> Result<u64, StoreError> {
        self.inner.clear_all().await
    }

    async fn records(&self) -> Result<Vec<CacheRecord<V>>, StoreError> {
        self.inner.records().await
    }
}

pub fn place(id: &str, name: &str, open_now: Option<bool>) -> PlaceRecord {
    PlaceRecord {
        place_id: id.to_string(),
        name: name.to_string(),
        address: format!("{} street", name),
        lat: 10.77,
        lng: 106.70,
        distance_km: 1.2,
        open_now,
    }
}

pub fn idea(dish: &str, search_query: &str) -> RawSuggestion {
    RawSuggestion {
        dish_name: dish.to_string(),
        search_query: search_query.to_string(),
        image_keyword: dish.to_lowercase(),
        mood_description: format!("{} fits the mood", dish),
        suggested_activity: "walk by the river".to_string(),
    }
}

pub fn recipe(dish: &str) -> RecipeDetails {
    RecipeDetails {
        dish_name: dish.to_string(),
        english_name: format!("{} (en)", dish),
        description: format!("A classic {}", dish),
        meta: RecipeMeta::default(),
        ingredients: vec![IngredientItem {
            item: "rice noodles".to_string(),
            amount: "200g".to_string(),
            note: None,
        }],
        steps: vec![StepItem {
            step_index: 1,
            instruction: "Simmer the broth".to_string(),
            timer: StepTimer::default(),
            is_critical: false,
        }],
        tips: String::new(),
        image_url: None,
    }
}
