//! Payload models held by the cache tiers.

pub mod place;
pub mod preview;
pub mod recipe;
pub mod suggestion;

pub use place::{Coordinates, PlaceRecord};
pub use preview::{GeneratedPreview, RecipePreview};
pub use recipe::{IngredientItem, RecipeDetails, RecipeMeta, StepItem, StepTimer};
pub use suggestion::{RawSuggestion, Suggestion, SuggestionKeywords, FALLBACK_PLACE_ID};
