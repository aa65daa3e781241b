//! Recommendation models.

use serde::{Deserialize, Serialize};

use super::PlaceRecord;

/// Place id used when no real place matched an idea.
pub const FALLBACK_PLACE_ID: &str = "fallback";

/// A dish idea from the generator, not yet tied to a real place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSuggestion {
    pub dish_name: String,
    /// Query used to find a matching place.
    pub search_query: String,
    /// Short English keyword for the photo lookup.
    pub image_keyword: String,
    pub mood_description: String,
    #[serde(default)]
    pub suggested_activity: String,
}

/// Deep-link search keywords for other apps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionKeywords {
    pub grab: String,
    pub tiktok: String,
}

/// A swipe card: dish idea + real place + photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub dish_name: String,
    pub reason: String,
    pub suggested_activity: String,
    pub keywords: SuggestionKeywords,
    pub price_range: String,
    pub restaurant: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    /// Kilometres from the user, `None` when the place is unknown.
    pub distance_km: Option<f64>,
    pub photo_url: String,
    pub place_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
}

impl Suggestion {
    /// Card for an idea matched to a real place.
    pub fn matched(index: usize, idea: RawSuggestion, place: PlaceRecord, photo_url: String) -> Self {
        Self {
            id: format!("suggestion-{}", index),
            keywords: SuggestionKeywords {
                grab: format!("{} {}", idea.dish_name, place.name),
                tiktok: format!("{} {} review", idea.dish_name, place.name),
            },
            dish_name: idea.dish_name,
            reason: idea.mood_description,
            suggested_activity: idea.suggested_activity,
            price_range: String::new(),
            restaurant: place.name,
            address: place.address,
            lat: place.lat,
            lng: place.lng,
            distance_km: Some(place.distance_km),
            photo_url,
            place_id: place.place_id,
            open_now: place.open_now,
        }
    }

    /// Card for an idea with no place match; the search query stands in for the restaurant.
    pub fn unmatched(index: usize, idea: RawSuggestion, photo_url: String) -> Self {
        Self {
            id: format!("proposal-{}", index),
            keywords: SuggestionKeywords {
                grab: idea.dish_name.clone(),
                tiktok: format!("{} review", idea.dish_name),
            },
            dish_name: idea.dish_name,
            reason: idea.mood_description,
            suggested_activity: idea.suggested_activity,
            price_range: String::new(),
            restaurant: idea.search_query,
            address: String::new(),
            lat: 0.0,
            lng: 0.0,
            distance_km: None,
            photo_url,
            place_id: FALLBACK_PLACE_ID.to_string(),
            open_now: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.open_now == Some(false)
    }
}
