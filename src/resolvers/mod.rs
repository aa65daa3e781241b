//! Cache-first resolvers: the only entry points the UI layer calls.
//!
//! Each resolver checks its tiers in priority order, falls back to the
//! generation gateway on a full miss, writes the fresh value back and reports
//! which tier answered.

mod background;
mod pipeline;
mod recipe;
mod recommendation;
mod search;
mod tiered;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

pub use background::WriteBackQueue;
pub use pipeline::{ClosedPlacePolicy, RecommendationPipeline};
pub use recipe::RecipeResolver;
pub use recommendation::{RecommendationCache, RecommendationResolver, RECOMMENDATION_NAMESPACE};
pub use search::SearchResultResolver;
pub use tiered::{Tier, TierHit, TieredStore};

/// Which tier answered a recipe lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeSource {
    Local,
    Remote,
    Generation,
}

/// Which tier answered a search lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Cache,
    Api,
}

/// Which tier answered a recommendation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Cache,
    Generation,
}

/// A value plus the tier it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved<V, S> {
    pub value: V,
    pub source: S,
}

impl<V, S> Resolved<V, S> {
    pub fn new(value: V, source: S) -> Self {
        Self { value, source }
    }
}

pub type SourceCallback<S> = Arc<dyn Fn(S) + Send + Sync>;

/// Per-call resolver options.
pub struct ResolveOptions<S> {
    /// Skip every cache tier and go straight to generation.
    pub force_refresh: bool,
    /// Told which tier is about to answer. Generation is announced before the
    /// slow call starts.
    pub on_source: Option<SourceCallback<S>>,
}

impl<S> Default for ResolveOptions<S> {
    fn default() -> Self {
        Self {
            force_refresh: false,
            on_source: None,
        }
    }
}

impl<S> Clone for ResolveOptions<S> {
    fn clone(&self) -> Self {
        Self {
            force_refresh: self.force_refresh,
            on_source: self.on_source.clone(),
        }
    }
}

impl<S> fmt::Debug for ResolveOptions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("force_refresh", &self.force_refresh)
            .field("on_source", &self.on_source.is_some())
            .finish()
    }
}

impl<S: Copy> ResolveOptions<S> {
    pub fn refresh(force_refresh: bool) -> Self {
        Self {
            force_refresh,
            on_source: None,
        }
    }

    #[must_use]
    pub fn on_source(mut self, callback: impl Fn(S) + Send + Sync + 'static) -> Self {
        self.on_source = Some(Arc::new(callback));
        self
    }

    pub(crate) fn announce(&self, source: S) {
        if let Some(callback) = &self.on_source {
            callback(source);
        }
    }
}
