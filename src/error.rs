//! Caller-facing failures.
//!
//! Only the generation stage can fail a request; store problems are absorbed
//! inside the resolvers. Each resolver has exactly one user-visible message.

use thiserror::Error;

use crate::generation::GenerationError;

#[derive(Debug, Error)]
pub enum RecipeUnavailable {
    #[error("could not produce a recipe right now")]
    EmptyDishName,

    #[error("could not produce a recipe right now")]
    Generation {
        dish: String,
        #[source]
        cause: GenerationError,
    },
}

#[derive(Debug, Error)]
#[error("could not produce search results right now")]
pub struct SearchUnavailable {
    pub query: String,
    #[source]
    pub cause: GenerationError,
}

#[derive(Debug, Error)]
pub enum NoResultsAvailable {
    #[error("could not produce recommendations right now")]
    Generation(#[source] GenerationError),

    /// Every idea was filtered out.
    #[error("could not produce recommendations right now")]
    Empty,
}

impl NoResultsAvailable {
    pub fn cause(&self) -> Option<&GenerationError> {
        match self {
            Self::Generation(e) => Some(e),
            Self::Empty => None,
        }
    }
}
