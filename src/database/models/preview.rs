//! Recipe search result models.

use serde::{Deserialize, Serialize};

/// A search hit as produced by the generator, before enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPreview {
    pub dish_name: String,
    pub english_name: String,
    pub description: String,
    pub difficulty: String,
    pub cook_time: String,
}

/// A recipe card in the search result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePreview {
    pub id: String,
    pub dish_name: String,
    pub english_name: String,
    pub description: String,
    pub difficulty: String,
    pub cook_time: String,
    pub image_url: String,
}

impl RecipePreview {
    /// Attach a list position and an image to a generated hit.
    pub fn from_generated(index: usize, generated: GeneratedPreview, image_url: String) -> Self {
        Self {
            id: format!("search-{}", index),
            dish_name: generated.dish_name,
            english_name: generated.english_name,
            description: generated.description,
            difficulty: generated.difficulty,
            cook_time: generated.cook_time,
            image_url,
        }
    }
}
