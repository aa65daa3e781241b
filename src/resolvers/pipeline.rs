//! Recommendation pipeline: dish ideas -> real places + photos.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use crate::database::{Coordinates, RawSuggestion, Suggestion};
use crate::error::NoResultsAvailable;
use crate::generation::{GenerationGateway, GenerationRequest};
use crate::services::{ImageLookup, PlaceLookup};

/// What to do with candidates whose place reports closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosedPlacePolicy {
    /// Drop closed places, but keep them all if nothing is open.
    #[default]
    AllowClosedWhenNoneOpen,
    /// Always drop closed places.
    ExcludeClosed,
}

impl ClosedPlacePolicy {
    /// Apply the policy. Unknown opening state counts as open.
    pub fn apply(self, candidates: Vec<Suggestion>) -> Vec<Suggestion> {
        let total = candidates.len();
        let (open, closed): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|s| !s.is_closed());

        match self {
            Self::AllowClosedWhenNoneOpen if open.is_empty() && !closed.is_empty() => {
                info!("All {} candidate places are closed, keeping them", total);
                closed
            }
            _ => {
                if !closed.is_empty() {
                    debug!("Dropped {} closed places", closed.len());
                }
                open
            }
        }
    }
}

/// Turns a mood context into swipe cards.
pub struct RecommendationPipeline {
    ideas: GenerationGateway<Vec<RawSuggestion>>,
    places: Arc<dyn PlaceLookup>,
    images: Arc<dyn ImageLookup>,
    closed: ClosedPlacePolicy,
}

impl RecommendationPipeline {
    pub fn new(
        ideas: GenerationGateway<Vec<RawSuggestion>>,
        places: Arc<dyn PlaceLookup>,
        images: Arc<dyn ImageLookup>,
    ) -> Self {
        Self {
            ideas,
            places,
            images,
            closed: ClosedPlacePolicy::default(),
        }
    }

    #[must_use]
    pub fn closed_places(mut self, policy: ClosedPlacePolicy) -> Self {
        self.closed = policy;
        self
    }

    pub async fn run<S: AsRef<str>>(
        &self,
        location: &str,
        tags: &[S],
        origin: Coordinates,
    ) -> Result<Vec<Suggestion>, NoResultsAvailable> {
        let mood: Vec<&str> = tags.iter().map(AsRef::as_ref).collect();
        let request = GenerationRequest::new(mood.join(", "))
            .context(format!("near {}", location.trim()))
            .origin(origin);

        let ideas = self
            .ideas
            .generate(&request)
            .await
            .map_err(NoResultsAvailable::Generation)?;
        debug!("Hydrating {} ideas for '{}'", ideas.len(), location);

        let cards = join_all(
            ideas
                .into_iter()
                .enumerate()
                .map(|(index, idea)| self.hydrate(index, idea, origin)),
        )
        .await;

        let cards = self.closed.apply(cards);
        if cards.is_empty() {
            return Err(NoResultsAvailable::Empty);
        }
        Ok(cards)
    }

    async fn hydrate(&self, index: usize, idea: RawSuggestion, origin: Coordinates) -> Suggestion {
        let (place, photo) = futures::join!(
            self.places.find_nearby_or_by_name(&idea.search_query, origin),
            self.images.image_for(&idea.image_keyword),
        );

        match place {
            Some(place) => Suggestion::matched(index, idea, place, photo),
            None => {
                debug!("No place for '{}', using fallback card", idea.search_query);
                Suggestion::unmatched(index, idea, photo)
            }
        }
    }
}
