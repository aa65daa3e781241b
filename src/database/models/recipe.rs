//! Recipe detail models.

use serde::{Deserialize, Serialize};

/// One ingredient line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientItem {
    pub item: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Countdown attached to a cooking step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTimer {
    pub has_timer: bool,
    /// Seconds to count down (0 when `has_timer` is false).
    #[serde(default)]
    pub duration_seconds: u32,
    #[serde(default)]
    pub label: String,
}

/// A single cooking step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepItem {
    pub step_index: u32,
    pub instruction: String,
    #[serde(default)]
    pub timer: StepTimer,
    /// Easy to get wrong; the UI highlights it.
    #[serde(default)]
    pub is_critical: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeMeta {
    pub prep_time: String,
    pub cook_time: String,
    pub difficulty: String,
    pub calories: String,
    pub servings: String,
}

/// Full recipe as shown on the recipe detail screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetails {
    pub dish_name: String,
    /// English name, used as the image search keyword.
    #[serde(default)]
    pub english_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub meta: RecipeMeta,
    #[serde(default)]
    pub ingredients: Vec<IngredientItem>,
    pub steps: Vec<StepItem>,
    #[serde(default)]
    pub tips: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl RecipeDetails {
    /// Keyword to look an image up with.
    pub fn image_keyword(&self) -> &str {
        if self.english_name.trim().is_empty() {
            &self.dish_name
        } else {
            &self.english_name
        }
    }
}
